use chrono::Utc;
use domain::dto::{DeliveryDto, ItemDto, OrderDto, PaymentDto};
use rand::Rng;
use rand::distributions::Alphanumeric;

fn random_string(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Builds a structurally valid order with a fresh random `order_uid`, the
/// way the original importer mints synthetic load: every field populated
/// with plausible random data rather than a fixed fixture, so repeated runs
/// don't collide on unique keys.
pub fn random_valid_order(rng: &mut impl Rng) -> OrderDto {
    let order_uid = random_string(rng, 19);
    let track_number = format!("WBIL{}", random_string(rng, 10).to_uppercase());

    OrderDto {
        order_uid,
        track_number: track_number.clone(),
        entry: "WBIL".into(),
        delivery: Some(DeliveryDto {
            name: "Synthetic Buyer".into(),
            phone: format!("+1{:010}", rng.gen_range(0..9_999_999_999u64)),
            zip: format!("{:07}", rng.gen_range(0..9_999_999u32)),
            city: "Springfield".into(),
            address: "1 Load Gen Way".into(),
            region: "".into(),
            email: format!("{}@example.com", random_string(rng, 8).to_lowercase()),
        }),
        payment: Some(PaymentDto {
            transaction: random_string(rng, 20),
            request_id: "".into(),
            currency: "USD".into(),
            provider: "wbpay".into(),
            amount: rng.gen_range(100..100_000),
            payment_dt: Utc::now().timestamp(),
            bank: "alpha".into(),
            delivery_cost: rng.gen_range(0..5_000),
            goods_total: rng.gen_range(100..100_000),
            custom_fee: 0,
        }),
        items: vec![ItemDto {
            chrt_id: rng.gen_range(1..10_000_000),
            track_number,
            price: rng.gen_range(10..10_000),
            rid: random_string(rng, 21),
            name: "Synthetic Item".into(),
            sale: rng.gen_range(0..=50),
            size: "0".into(),
            total_price: rng.gen_range(10..10_000),
            nm_id: rng.gen_range(1..10_000_000),
            brand: "Generic".into(),
            status: 202,
        }],
        locale: "en".into(),
        internal_signature: "".into(),
        customer_id: random_string(rng, 10),
        delivery_service: "meest".into(),
        shardkey: rng.gen_range(0..10).to_string(),
        sm_id: rng.gen_range(1..1000),
        date_created: Utc::now(),
        oof_shard: "1".into(),
    }
}

/// Deliberately poison payloads meant to be routed to the DLQ by the
/// consumer: one is simply not JSON, the rest are a valid envelope missing
/// a field the validator requires.
pub fn random_invalid_payload(rng: &mut impl Rng) -> Vec<u8> {
    if rng.gen_bool(0.3) {
        return b"{not-valid-json".to_vec();
    }

    let mut order = random_valid_order(rng);
    match rng.gen_range(0..3) {
        0 => order.delivery = None,
        1 => order.items.clear(),
        _ => order.locale = "english".into(),
    }

    serde_json::to_vec(&order).expect("order dto always serializes")
}
