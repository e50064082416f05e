//! Wire shape decoded directly from a broker message payload (§6).
//!
//! Every field the spec's data model names is present. Delivery/Payment are
//! `Option` because a malformed message can omit them entirely — validation
//! (not serde) is responsible for rejecting that, so the error message can
//! name the missing field instead of failing at decode time with an opaque
//! serde error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderDto {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Option<DeliveryDto>,
    pub payment: Option<PaymentDto>,
    #[serde(default)]
    pub items: Vec<ItemDto>,
    pub locale: String,
    #[serde(default)]
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryDto {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub region: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentDto {
    pub transaction: String,
    #[serde(default)]
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemDto {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    #[serde(default)]
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}
