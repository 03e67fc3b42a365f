use db::models::order::Order;

use crate::{error::IngestError, store::IngestStore};

/// Two rows are enough to tell a unique reference from a duplicated one.
const LOOKUP_LIMIT: u64 = 2;

/// Finds the single order for `reference` within `org_id`.
pub async fn resolve_order<S>(store: &S, reference: &str, org_id: &str) -> Result<Order, IngestError>
where
    S: IngestStore + ?Sized,
{
    if reference.trim().is_empty() {
        return Err(IngestError::RecordValidation(
            "reference number is empty".to_string(),
        ));
    }
    if org_id.trim().is_empty() {
        return Err(IngestError::RecordValidation(
            "organization id is empty".to_string(),
        ));
    }

    let mut orders = store.find_orders(reference, org_id, LOOKUP_LIMIT).await?;
    match orders.len() {
        0 => Err(IngestError::OrderNotFound {
            reference: reference.to_string(),
            org_id: org_id.to_string(),
        }),
        1 => Ok(orders.remove(0)),
        _ => Err(IngestError::AmbiguousReference {
            reference: reference.to_string(),
            org_id: org_id.to_string(),
        }),
    }
}
