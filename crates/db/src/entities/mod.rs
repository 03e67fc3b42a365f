pub mod consignment_event;
pub mod orders;
