use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Order isn't valid:\n\t-{0}")]
    Validation(String),

    #[error("incorrect aggregate: delivery, payment, or items missing")]
    IncorrectAggregate,
}
