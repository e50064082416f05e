//! Hand-rolled validation of the wire DTO.
//!
//! Mirrors the rule set and message format of the Go original's
//! `validator.v10`-based `ValidateOrder`: one line per violated field,
//! `"Field <Name> isn't valid, validation tag - <rule>."`, joined with
//! `"\n\t-"` so the final message matches `DomainError::Validation`'s
//! display format exactly.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dto::{DeliveryDto, ItemDto, OrderDto, PaymentDto};
use crate::error::DomainError;

static PHONE_E164: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());

struct Errors(Vec<String>);

impl Errors {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn push(&mut self, field: &str, tag: &str) {
        self.0
            .push(format!("Field {field} isn't valid, validation tag - {tag}."));
    }

    fn require(&mut self, field: &str, ok: bool) {
        if !ok {
            self.push(field, "required");
        }
    }
}

pub fn validate_order(order: &OrderDto) -> Result<(), DomainError> {
    let mut errs = Errors::new();

    errs.require("OrderUID", !order.order_uid.is_empty());
    errs.require("TrackNumber", !order.track_number.is_empty());
    errs.require("Entry", !order.entry.is_empty());

    match &order.delivery {
        Some(d) => validate_delivery(d, &mut errs),
        None => errs.push("Delivery", "required"),
    }

    match &order.payment {
        Some(p) => validate_payment(p, &mut errs),
        None => errs.push("Payment", "required"),
    }

    if order.items.is_empty() {
        errs.push("Items", "required");
    } else {
        for item in &order.items {
            validate_item(item, &mut errs);
        }
    }

    if order.locale.len() != 2 {
        errs.push("Locale", "len=2");
    } else if !ALPHA.is_match(&order.locale) {
        errs.push("Locale", "alpha");
    }

    errs.require("CustomerID", !order.customer_id.is_empty());
    errs.require("DeliveryService", !order.delivery_service.is_empty());
    errs.require("Shardkey", !order.shardkey.is_empty());
    errs.require("SmID", order.sm_id > 0);
    errs.require("OofShard", !order.oof_shard.is_empty());

    if errs.0.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errs.0.join("\n\t-")))
    }
}

fn validate_delivery(d: &DeliveryDto, errs: &mut Errors) {
    errs.require("Name", !d.name.is_empty());
    if d.phone.is_empty() {
        errs.push("Phone", "required");
    } else if !PHONE_E164.is_match(&d.phone) {
        errs.push("Phone", "e164");
    }
    errs.require("Zip", !d.zip.is_empty());
    errs.require("City", !d.city.is_empty());
    errs.require("Address", !d.address.is_empty());
    if d.email.is_empty() {
        errs.push("Email", "required");
    } else if !EMAIL.is_match(&d.email) {
        errs.push("Email", "email");
    }
}

fn validate_payment(p: &PaymentDto, errs: &mut Errors) {
    errs.require("Transaction", !p.transaction.is_empty());

    if p.currency.len() != 3 {
        errs.push("Currency", "len=3");
    } else if !ALPHA.is_match(&p.currency) {
        errs.push("Currency", "alpha");
    }
    if p.currency.is_empty() {
        errs.push("Currency", "required");
    }

    errs.require("Provider", !p.provider.is_empty());
    if p.amount < 0 {
        errs.push("Amount", "gte=0");
    }
    errs.require("PaymentDT", p.payment_dt != 0);
    errs.require("Bank", !p.bank.is_empty());
    if p.delivery_cost < 0 {
        errs.push("DeliveryCost", "gte=0");
    }
    if p.goods_total < 0 {
        errs.push("GoodsTotal", "gte=0");
    }
    if p.custom_fee < 0 {
        errs.push("CustomFee", "gte=0");
    }
}

fn validate_item(i: &ItemDto, errs: &mut Errors) {
    if i.chrt_id <= 0 {
        errs.push("ChrtID", "gt=0");
    }
    errs.require("TrackNumber", !i.track_number.is_empty());
    if i.price < 0 {
        errs.push("Price", "gte=0");
    }
    errs.require("RID", !i.rid.is_empty());
    errs.require("Name", !i.name.is_empty());
    if !(0..=100).contains(&i.sale) {
        errs.push("Sale", "gte=0,lte=100");
    }
    if i.total_price < 0 {
        errs.push("TotalPrice", "gte=0");
    }
    if i.nm_id <= 0 {
        errs.push("NmID", "gt=0");
    }
    errs.require("Brand", !i.brand.is_empty());
    errs.require("Status", i.status != 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{DeliveryDto, ItemDto, OrderDto, PaymentDto};
    use chrono::Utc;

    fn valid_delivery() -> DeliveryDto {
        DeliveryDto {
            name: "Test Testov".into(),
            phone: "+9720000000".into(),
            zip: "2639809".into(),
            city: "Kiryat Mozkin".into(),
            address: "Ploshad Mira 15".into(),
            region: "Kraiot".into(),
            email: "test@gmail.com".into(),
        }
    }

    fn valid_payment() -> PaymentDto {
        PaymentDto {
            transaction: "b563feb7b2b84b6test".into(),
            request_id: "".into(),
            currency: "USD".into(),
            provider: "wbpay".into(),
            amount: 1817,
            payment_dt: 1637907727,
            bank: "alpha".into(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        }
    }

    fn valid_item() -> ItemDto {
        ItemDto {
            chrt_id: 9934930,
            track_number: "WBILMTESTTRACK".into(),
            price: 453,
            rid: "ab4219087a764ae0btest".into(),
            name: "Mascaras".into(),
            sale: 30,
            size: "0".into(),
            total_price: 317,
            nm_id: 2389212,
            brand: "Vivienne Sabo".into(),
            status: 202,
        }
    }

    fn valid_order() -> OrderDto {
        OrderDto {
            order_uid: "b563feb7b2b84b6test".into(),
            track_number: "WBILMTESTTRACK".into(),
            entry: "WBIL".into(),
            delivery: Some(valid_delivery()),
            payment: Some(valid_payment()),
            items: vec![valid_item()],
            locale: "en".into(),
            internal_signature: "".into(),
            customer_id: "test".into(),
            delivery_service: "meest".into(),
            shardkey: "9".into(),
            sm_id: 99,
            date_created: Utc::now(),
            oof_shard: "1".into(),
        }
    }

    #[test]
    fn accepts_a_well_formed_order() {
        assert!(validate_order(&valid_order()).is_ok());
    }

    #[test]
    fn rejects_empty_order_uid() {
        let mut o = valid_order();
        o.order_uid = "".into();
        let err = validate_order(&o).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("OrderUID"));
        assert!(msg.contains("required"));
    }

    #[test]
    fn rejects_missing_delivery() {
        let mut o = valid_order();
        o.delivery = None;
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Delivery"));
    }

    #[test]
    fn rejects_empty_items() {
        let mut o = valid_order();
        o.items = vec![];
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Items"));
    }

    #[test]
    fn rejects_out_of_range_sale() {
        let mut o = valid_order();
        o.items[0].sale = 150;
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Sale"));
    }

    #[test]
    fn rejects_bad_locale_length() {
        let mut o = valid_order();
        o.locale = "eng".into();
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Locale"));
    }

    #[test]
    fn rejects_bad_phone() {
        let mut o = valid_order();
        o.delivery.as_mut().unwrap().phone = "not-a-phone".into();
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Phone"));
    }

    #[test]
    fn rejects_bad_email() {
        let mut o = valid_order();
        o.delivery.as_mut().unwrap().email = "not-an-email".into();
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Email"));
    }

    #[test]
    fn rejects_bad_currency() {
        let mut o = valid_order();
        o.payment.as_mut().unwrap().currency = "US1".into();
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Currency"));
    }

    #[test]
    fn rejects_negative_amount() {
        let mut o = valid_order();
        o.payment.as_mut().unwrap().amount = -1;
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("Amount"));
    }

    #[test]
    fn rejects_zero_chrt_id() {
        let mut o = valid_order();
        o.items[0].chrt_id = 0;
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("ChrtID"));
    }

    #[test]
    fn rejects_zero_sm_id() {
        let mut o = valid_order();
        o.sm_id = 0;
        let msg = validate_order(&o).unwrap_err().to_string();
        assert!(msg.contains("SmID"));
    }
}
