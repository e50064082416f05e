use sqlx::PgPool;

/// Creates the four order tables if they don't already exist. Run once at
/// startup before the consumer or HTTP surface come up.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS orders (
  order_uid TEXT PRIMARY KEY,
  track_number TEXT NOT NULL,
  entry TEXT NOT NULL,
  locale TEXT NOT NULL,
  internal_signature TEXT NOT NULL,
  customer_id TEXT NOT NULL,
  delivery_service TEXT NOT NULL,
  shardkey TEXT NOT NULL,
  sm_id BIGINT NOT NULL,
  date_created TIMESTAMPTZ NOT NULL,
  oof_shard TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS deliveries (
  order_uid TEXT PRIMARY KEY REFERENCES orders(order_uid),
  name TEXT NOT NULL,
  phone TEXT NOT NULL,
  zip TEXT NOT NULL,
  city TEXT NOT NULL,
  address TEXT NOT NULL,
  region TEXT NOT NULL,
  email TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS payments (
  order_uid TEXT PRIMARY KEY REFERENCES orders(order_uid),
  transaction TEXT NOT NULL,
  request_id TEXT NOT NULL,
  currency TEXT NOT NULL,
  provider TEXT NOT NULL,
  amount BIGINT NOT NULL,
  payment_dt BIGINT NOT NULL,
  bank TEXT NOT NULL,
  delivery_cost BIGINT NOT NULL,
  goods_total BIGINT NOT NULL,
  custom_fee BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS items (
  id BIGSERIAL PRIMARY KEY,
  order_uid TEXT NOT NULL REFERENCES orders(order_uid),
  chrt_id BIGINT NOT NULL,
  track_number TEXT NOT NULL,
  price BIGINT NOT NULL,
  rid TEXT NOT NULL,
  name TEXT NOT NULL,
  sale BIGINT NOT NULL,
  size TEXT NOT NULL,
  total_price BIGINT NOT NULL,
  nm_id BIGINT NOT NULL,
  brand TEXT NOT NULL,
  status BIGINT NOT NULL,
  UNIQUE (order_uid, rid)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_items_order_uid ON items(order_uid);"#)
        .execute(pool)
        .await?;

    Ok(())
}
