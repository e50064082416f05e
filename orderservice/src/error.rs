use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("order not found")]
    NotFound,

    #[error("incorrect aggregate: delivery, payment, or items missing")]
    IncorrectAggregate,

    #[error("failed to execute transaction after multiple retries: {0}")]
    RetryFailed(orderstorage::StorageError),

    #[error(transparent)]
    Storage(orderstorage::StorageError),
}
