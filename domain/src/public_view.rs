//! The shape returned by the HTTP read path (§4.3, §4.5, §6).
//!
//! This is deliberately the *narrowest* possible projection of
//! [`crate::model::Order`] — the only outward-facing representation of an
//! order, and the one place in the crate that must never leak customer PII
//! (name/phone/email/address) or internal identifiers (transaction id, bank,
//! rid, shardkey, internal_signature) to an HTTP caller. Field set matches
//! the original's `dto.PublicOrder`/`dto.PublicItem` exactly: order uid,
//! creation time, the payment totals a customer would recognize on their own
//! order, the delivery service name, and a line-item summary per item.

use serde::{Deserialize, Serialize};

use crate::model::Order;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicOrder {
    #[serde(rename = "OID")]
    pub oid: String,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub currency: String,
    pub amount: i64,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub delivery_service: String,
    pub items: Vec<PublicItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicItem {
    pub nm_id: i64,
    pub name: String,
    pub brand: String,
    pub size: String,
    pub price: i64,
    pub sale: i64,
    pub total_price: i64,
}

impl From<&Order> for PublicOrder {
    fn from(o: &Order) -> Self {
        PublicOrder {
            oid: o.order_uid.clone(),
            date_created: o.date_created,
            currency: o.payment.currency.clone(),
            amount: o.payment.amount,
            delivery_cost: o.payment.delivery_cost,
            goods_total: o.payment.goods_total,
            delivery_service: o.delivery_service.clone(),
            items: o
                .items
                .iter()
                .map(|i| PublicItem {
                    nm_id: i.nm_id,
                    name: i.name.clone(),
                    brand: i.brand.clone(),
                    size: i.size.clone(),
                    price: i.price,
                    sale: i.sale,
                    total_price: i.total_price,
                })
                .collect(),
        }
    }
}

impl From<Order> for PublicOrder {
    fn from(o: Order) -> Self {
        PublicOrder::from(&o)
    }
}
