use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Delivery, Item, Payment};

use crate::error::StorageError;

/// The `orders` table row without its child entities — kept separate from
/// [`domain::Order`] so the four-way fan-out in the service layer can fetch
/// header/delivery/payment/items independently and assemble them itself.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderHeader {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

/// Persistence contract for the order aggregate, split into the same four
/// entities the wire format names. Implementations own the transaction
/// boundary for writes; reads are single-table and meant to be fanned out
/// concurrently by the caller.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Writes header, delivery, payment, and items in one transaction.
    /// A duplicate `order_uid` (or duplicate child row) surfaces as the
    /// matching `*Exists` variant rather than a generic database error.
    async fn add(
        &self,
        header: &OrderHeader,
        delivery: &Delivery,
        payment: &Payment,
        items: &[Item],
    ) -> Result<(), StorageError>;

    async fn get_order_header(&self, order_uid: &str) -> Result<OrderHeader, StorageError>;
    async fn get_delivery(&self, order_uid: &str) -> Result<Delivery, StorageError>;
    async fn get_payment(&self, order_uid: &str) -> Result<Payment, StorageError>;
    async fn get_items(&self, order_uid: &str) -> Result<Vec<Item>, StorageError>;

    async fn get_all_order_headers(&self) -> Result<Vec<OrderHeader>, StorageError>;
    async fn get_all_deliveries(&self) -> Result<Vec<(String, Delivery)>, StorageError>;
    async fn get_all_payments(&self) -> Result<Vec<(String, Payment)>, StorageError>;
    async fn get_all_items(&self) -> Result<Vec<(String, Item)>, StorageError>;
}
