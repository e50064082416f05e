//! Projects a validated [`OrderDto`] into the canonical [`Order`] aggregate.
//!
//! The Go original splits this into `modelToService`/`serviceToModel`-style
//! functions that each re-check nilness and raise `IncorrectModelOrder` /
//! `IncorrectServiceOrder` on the way. Since validation already guarantees
//! `delivery`/`payment`/`items` are present by the time this runs, the only
//! case left here is a defensive one: something called this without running
//! `validate_order` first.

use crate::dto::OrderDto;
use crate::error::DomainError;
use crate::model::{Delivery, Item, Order, Payment};

pub fn order_from_dto(dto: OrderDto) -> Result<Order, DomainError> {
    let delivery = dto.delivery.ok_or(DomainError::IncorrectAggregate)?;
    let payment = dto.payment.ok_or(DomainError::IncorrectAggregate)?;
    if dto.items.is_empty() {
        return Err(DomainError::IncorrectAggregate);
    }

    Ok(Order {
        order_uid: dto.order_uid,
        track_number: dto.track_number,
        entry: dto.entry,
        delivery: Delivery {
            name: delivery.name,
            phone: delivery.phone,
            zip: delivery.zip,
            city: delivery.city,
            address: delivery.address,
            region: delivery.region,
            email: delivery.email,
        },
        payment: Payment {
            transaction: payment.transaction,
            request_id: payment.request_id,
            currency: payment.currency,
            provider: payment.provider,
            amount: payment.amount,
            payment_dt: payment.payment_dt,
            bank: payment.bank,
            delivery_cost: payment.delivery_cost,
            goods_total: payment.goods_total,
            custom_fee: payment.custom_fee,
        },
        items: dto
            .items
            .into_iter()
            .map(|i| Item {
                chrt_id: i.chrt_id,
                track_number: i.track_number,
                price: i.price,
                rid: i.rid,
                name: i.name,
                sale: i.sale,
                size: i.size,
                total_price: i.total_price,
                nm_id: i.nm_id,
                brand: i.brand,
                status: i.status,
            })
            .collect(),
        locale: dto.locale,
        internal_signature: dto.internal_signature,
        customer_id: dto.customer_id,
        delivery_service: dto.delivery_service,
        shardkey: dto.shardkey,
        sm_id: dto.sm_id,
        date_created: dto.date_created,
        oof_shard: dto.oof_shard,
    })
}
