pub mod dto;
pub mod error;
pub mod model;
pub mod project;
pub mod public_view;
pub mod validate;

pub use dto::OrderDto;
pub use error::DomainError;
pub use model::{Delivery, Item, Order, Payment};
pub use project::order_from_dto;
pub use public_view::{PublicItem, PublicOrder};
pub use validate::validate_order;

/// Decode, validate, and project a raw message payload into a ready-to-store
/// aggregate in one call — the shape every caller (broker handler, HTTP seed
/// path, load generator) actually wants.
pub fn decode_and_validate(payload: &[u8]) -> Result<Order, DomainError> {
    let dto: OrderDto = serde_json::from_slice(payload)
        .map_err(|e| DomainError::Validation(format!("payload isn't valid JSON: {e}")))?;
    validate_order(&dto)?;
    order_from_dto(dto)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_json() {
        let err = decode_and_validate(b"not json").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
