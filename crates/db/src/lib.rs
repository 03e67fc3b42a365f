use sea_orm::{ConnectOptions, Database, DatabaseConnection, sqlx};

pub mod entities;
pub mod models;
pub mod query;
pub mod retry;

pub use retry::RetryPolicy;
pub use sea_orm::{DbErr, RuntimeErr};

#[derive(Clone)]
pub struct DBService {
    pub pool: DatabaseConnection,
}

impl DBService {
    /// Opens a pool of at most `max_connections` and checks it with a ping.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options
            .max_connections(max_connections.max(1))
            .sqlx_logging(false);
        let pool = Database::connect(options).await?;
        pool.ping().await?;
        Ok(DBService { pool })
    }

    /// [`DBService::connect`] under `policy`, retrying only connection failures.
    pub async fn connect_with_retry(
        database_url: &str,
        max_connections: u32,
        policy: &RetryPolicy,
    ) -> Result<DBService, DbErr> {
        retry::retry_with_policy(policy, is_connection_error, || {
            Self::connect(database_url, max_connections)
        })
        .await
    }
}

/// True for errors that mean the database is unreachable rather than that a
/// single statement was rejected.
pub fn is_connection_error(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        // A socket that breaks under an acquired connection surfaces from the
        // statement itself.
        DbErr::Query(RuntimeErr::SqlxError(inner)) | DbErr::Exec(RuntimeErr::SqlxError(inner)) => {
            matches!(
                inner.as_ref(),
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::WorkerCrashed
            )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use super::*;

    fn query_err(err: sqlx::Error) -> DbErr {
        DbErr::Query(RuntimeErr::SqlxError(Arc::new(err)))
    }

    #[tokio::test]
    async fn connects_to_in_memory_sqlite() {
        let db = DBService::connect("sqlite::memory:", 1).await.unwrap();
        assert!(db.pool.ping().await.is_ok());
    }

    #[test]
    fn classifies_connection_errors() {
        assert!(!is_connection_error(&DbErr::RecordNotFound("x".to_string())));
        assert!(!is_connection_error(&DbErr::Custom("x".to_string())));
        assert!(is_connection_error(&DbErr::Conn(RuntimeErr::Internal(
            "refused".to_string()
        ))));
    }

    #[test]
    fn broken_socket_during_statement_is_a_connection_error() {
        let reset = || sqlx::Error::Io(io::Error::from(io::ErrorKind::ConnectionReset));

        assert!(is_connection_error(&query_err(reset())));
        assert!(is_connection_error(&DbErr::Exec(RuntimeErr::SqlxError(
            Arc::new(reset())
        ))));
        assert!(is_connection_error(&query_err(sqlx::Error::PoolClosed)));
        assert!(is_connection_error(&query_err(sqlx::Error::PoolTimedOut)));
        assert!(is_connection_error(&query_err(sqlx::Error::WorkerCrashed)));

        assert!(!is_connection_error(&query_err(sqlx::Error::RowNotFound)));
        assert!(!is_connection_error(&DbErr::Exec(RuntimeErr::Internal(
            "constraint failed".to_string()
        ))));
    }
}
