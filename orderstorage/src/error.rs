use thiserror::Error;

/// The storage layer's own error taxonomy, kept deliberately close to the
/// original's sentinel error list so callers (the retry wrapper in
/// particular) can pattern-match on *kind* rather than parsing driver
/// error strings.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("order not found")]
    NotFound,

    /// A malformed or unparseable connection configuration (bad DSN, invalid
    /// pool options) — never worth retrying, since nothing about the target
    /// will change on the next attempt.
    #[error("invalid storage configuration: {0}")]
    ConfigInvalid(String),

    #[error("order {0} already exists")]
    OrderExists(String),

    #[error("delivery for order {0} already exists")]
    DeliveryExists(String),

    #[error("payment for order {0} already exists")]
    PaymentExists(String),

    #[error("item already exists for order {0}")]
    ItemExists(String),

    #[error("database connection is closed")]
    ConnectionClosed,

    /// Kept for taxonomy parity with the original's sentinel errors; ownership
    /// of `sqlx::Transaction` makes reusing a finished transaction a compile
    /// error here rather than a runtime one, so this variant is never built.
    #[error("transaction has already been completed")]
    TransactionCompleted,

    /// No caller constructs this directly today — cancellation here is
    /// cooperative future-drop, not an explicit context object, so there's
    /// no call site that observes "the caller cancelled" as a distinct
    /// outcome from a query. Kept so `is_transient` has an explicit,
    /// documented answer for it per the storage retry contract.
    #[error("operation cancelled")]
    OperationCancelled,

    #[error("operation timed out")]
    TimeoutExpired,

    #[error("unknown storage error: {0}")]
    Unknown(#[source] anyhow::Error),
}

impl StorageError {
    /// True for the one case the service layer must treat as success
    /// rather than a failed write: re-delivering an order that's already
    /// been persisted. Any other variant is a genuine failure.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            StorageError::OrderExists(_)
                | StorageError::DeliveryExists(_)
                | StorageError::PaymentExists(_)
                | StorageError::ItemExists(_)
        )
    }

    /// Whether retrying this error without changing anything could plausibly
    /// succeed. Not-found, cancellation, and deadline-exceeded are permanent
    /// conditions per the storage retry contract — only connection failures
    /// and unclassified errors are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::ConnectionClosed | StorageError::Unknown(_))
    }
}

pub(crate) fn classify_sqlx_error(err: sqlx::Error, order_uid: &str) -> StorageError {
    match &err {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        sqlx::Error::Configuration(_) => StorageError::ConfigInvalid(err.to_string()),
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => StorageError::ConnectionClosed,
        sqlx::Error::Io(_) => StorageError::ConnectionClosed,
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or_default();
                if constraint.contains("deliver") {
                    return StorageError::DeliveryExists(order_uid.to_string());
                }
                if constraint.contains("payment") {
                    return StorageError::PaymentExists(order_uid.to_string());
                }
                if constraint.contains("item") {
                    return StorageError::ItemExists(order_uid.to_string());
                }
                return StorageError::OrderExists(order_uid.to_string());
            }
            StorageError::Unknown(anyhow::Error::new(err))
        }
        _ => StorageError::Unknown(anyhow::Error::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_classify_as_config_invalid() {
        let err = sqlx::Error::Configuration("bad DSN: missing host".into());
        let classified = classify_sqlx_error(err, "");
        assert!(matches!(classified, StorageError::ConfigInvalid(_)));
    }

    #[test]
    fn config_invalid_is_neither_transient_nor_duplicate() {
        let err = StorageError::ConfigInvalid("bad DSN".into());
        assert!(!err.is_transient());
        assert!(!err.is_duplicate());
    }
}
