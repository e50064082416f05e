use async_trait::async_trait;
use domain::{Delivery, Item, Payment};
use sqlx::{PgPool, Row};

use crate::error::{StorageError, classify_sqlx_error};
use crate::repository::{OrderHeader, OrderRepository};

/// Postgres-backed implementation of [`OrderRepository`].
///
/// Responsible only for persistence and row mapping — retry policy lives
/// one layer up, the way the original keeps backoff out of the storage
/// package entirely.
pub struct PgOrderStorage {
    pool: PgPool,
}

impl PgOrderStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderRepository for PgOrderStorage {
    async fn add(
        &self,
        header: &OrderHeader,
        delivery: &Delivery,
        payment: &Payment,
        items: &[Item],
    ) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify_sqlx_error(e, &header.order_uid))?;

        let insert_order = sqlx::query(
            r#"
INSERT INTO orders
  (order_uid, track_number, entry, locale, internal_signature, customer_id,
   delivery_service, shardkey, sm_id, date_created, oof_shard)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11);
"#,
        )
        .bind(&header.order_uid)
        .bind(&header.track_number)
        .bind(&header.entry)
        .bind(&header.locale)
        .bind(&header.internal_signature)
        .bind(&header.customer_id)
        .bind(&header.delivery_service)
        .bind(&header.shardkey)
        .bind(header.sm_id)
        .bind(header.date_created)
        .bind(&header.oof_shard)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_order {
            let _ = tx.rollback().await;
            return Err(classify_sqlx_error(e, &header.order_uid));
        }

        let insert_delivery = sqlx::query(
            r#"
INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8);
"#,
        )
        .bind(&header.order_uid)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_delivery {
            let _ = tx.rollback().await;
            return Err(classify_sqlx_error(e, &header.order_uid));
        }

        let insert_payment = sqlx::query(
            r#"
INSERT INTO payments
  (order_uid, transaction, request_id, currency, provider, amount, payment_dt,
   bank, delivery_cost, goods_total, custom_fee)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11);
"#,
        )
        .bind(&header.order_uid)
        .bind(&payment.transaction)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.amount)
        .bind(payment.payment_dt)
        .bind(&payment.bank)
        .bind(payment.delivery_cost)
        .bind(payment.goods_total)
        .bind(payment.custom_fee)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_payment {
            let _ = tx.rollback().await;
            return Err(classify_sqlx_error(e, &header.order_uid));
        }

        for item in items {
            let insert_item = sqlx::query(
                r#"
INSERT INTO items
  (order_uid, chrt_id, track_number, price, rid, name, sale, size,
   total_price, nm_id, brand, status)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);
"#,
            )
            .bind(&header.order_uid)
            .bind(item.chrt_id)
            .bind(&item.track_number)
            .bind(item.price)
            .bind(&item.rid)
            .bind(&item.name)
            .bind(item.sale)
            .bind(&item.size)
            .bind(item.total_price)
            .bind(item.nm_id)
            .bind(&item.brand)
            .bind(item.status)
            .execute(&mut *tx)
            .await;

            if let Err(e) = insert_item {
                let _ = tx.rollback().await;
                return Err(classify_sqlx_error(e, &header.order_uid));
            }
        }

        tx.commit()
            .await
            .map_err(|e| classify_sqlx_error(e, &header.order_uid))
    }

    async fn get_order_header(&self, order_uid: &str) -> Result<OrderHeader, StorageError> {
        let row = sqlx::query(
            r#"
SELECT order_uid, track_number, entry, locale, internal_signature, customer_id,
       delivery_service, shardkey, sm_id, date_created, oof_shard
FROM orders WHERE order_uid = $1;
"#,
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, order_uid))?;

        let row = row.ok_or(StorageError::NotFound)?;
        Ok(OrderHeader {
            order_uid: row.get("order_uid"),
            track_number: row.get("track_number"),
            entry: row.get("entry"),
            locale: row.get("locale"),
            internal_signature: row.get("internal_signature"),
            customer_id: row.get("customer_id"),
            delivery_service: row.get("delivery_service"),
            shardkey: row.get("shardkey"),
            sm_id: row.get("sm_id"),
            date_created: row.get("date_created"),
            oof_shard: row.get("oof_shard"),
        })
    }

    async fn get_delivery(&self, order_uid: &str) -> Result<Delivery, StorageError> {
        let row = sqlx::query(
            r#"SELECT name, phone, zip, city, address, region, email FROM deliveries WHERE order_uid = $1;"#,
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, order_uid))?;

        let row = row.ok_or(StorageError::NotFound)?;
        Ok(Delivery {
            name: row.get("name"),
            phone: row.get("phone"),
            zip: row.get("zip"),
            city: row.get("city"),
            address: row.get("address"),
            region: row.get("region"),
            email: row.get("email"),
        })
    }

    async fn get_payment(&self, order_uid: &str) -> Result<Payment, StorageError> {
        let row = sqlx::query(
            r#"
SELECT transaction, request_id, currency, provider, amount, payment_dt, bank,
       delivery_cost, goods_total, custom_fee
FROM payments WHERE order_uid = $1;
"#,
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, order_uid))?;

        let row = row.ok_or(StorageError::NotFound)?;
        Ok(Payment {
            transaction: row.get("transaction"),
            request_id: row.get("request_id"),
            currency: row.get("currency"),
            provider: row.get("provider"),
            amount: row.get("amount"),
            payment_dt: row.get("payment_dt"),
            bank: row.get("bank"),
            delivery_cost: row.get("delivery_cost"),
            goods_total: row.get("goods_total"),
            custom_fee: row.get("custom_fee"),
        })
    }

    async fn get_items(&self, order_uid: &str) -> Result<Vec<Item>, StorageError> {
        let rows = sqlx::query(
            r#"
SELECT chrt_id, track_number, price, rid, name, sale, size, total_price, nm_id, brand, status
FROM items WHERE order_uid = $1;
"#,
        )
        .bind(order_uid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, order_uid))?;

        if rows.is_empty() {
            return Err(StorageError::NotFound);
        }

        Ok(rows.into_iter().map(row_to_item).collect())
    }

    async fn get_all_order_headers(&self) -> Result<Vec<OrderHeader>, StorageError> {
        let rows = sqlx::query(
            r#"
SELECT order_uid, track_number, entry, locale, internal_signature, customer_id,
       delivery_service, shardkey, sm_id, date_created, oof_shard
FROM orders;
"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, ""))?;

        Ok(rows
            .into_iter()
            .map(|row| OrderHeader {
                order_uid: row.get("order_uid"),
                track_number: row.get("track_number"),
                entry: row.get("entry"),
                locale: row.get("locale"),
                internal_signature: row.get("internal_signature"),
                customer_id: row.get("customer_id"),
                delivery_service: row.get("delivery_service"),
                shardkey: row.get("shardkey"),
                sm_id: row.get("sm_id"),
                date_created: row.get("date_created"),
                oof_shard: row.get("oof_shard"),
            })
            .collect())
    }

    async fn get_all_deliveries(&self) -> Result<Vec<(String, Delivery)>, StorageError> {
        let rows = sqlx::query(
            r#"SELECT order_uid, name, phone, zip, city, address, region, email FROM deliveries;"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, ""))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_uid: String = row.get("order_uid");
                (
                    order_uid,
                    Delivery {
                        name: row.get("name"),
                        phone: row.get("phone"),
                        zip: row.get("zip"),
                        city: row.get("city"),
                        address: row.get("address"),
                        region: row.get("region"),
                        email: row.get("email"),
                    },
                )
            })
            .collect())
    }

    async fn get_all_payments(&self) -> Result<Vec<(String, Payment)>, StorageError> {
        let rows = sqlx::query(
            r#"
SELECT order_uid, transaction, request_id, currency, provider, amount, payment_dt,
       bank, delivery_cost, goods_total, custom_fee
FROM payments;
"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, ""))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_uid: String = row.get("order_uid");
                (
                    order_uid,
                    Payment {
                        transaction: row.get("transaction"),
                        request_id: row.get("request_id"),
                        currency: row.get("currency"),
                        provider: row.get("provider"),
                        amount: row.get("amount"),
                        payment_dt: row.get("payment_dt"),
                        bank: row.get("bank"),
                        delivery_cost: row.get("delivery_cost"),
                        goods_total: row.get("goods_total"),
                        custom_fee: row.get("custom_fee"),
                    },
                )
            })
            .collect())
    }

    async fn get_all_items(&self) -> Result<Vec<(String, Item)>, StorageError> {
        let rows = sqlx::query(
            r#"
SELECT order_uid, chrt_id, track_number, price, rid, name, sale, size, total_price, nm_id, brand, status
FROM items;
"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(e, ""))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_uid: String = row.get("order_uid");
                (order_uid, row_to_item(row))
            })
            .collect())
    }
}

fn row_to_item(row: sqlx::postgres::PgRow) -> Item {
    Item {
        chrt_id: row.get("chrt_id"),
        track_number: row.get("track_number"),
        price: row.get("price"),
        rid: row.get("rid"),
        name: row.get("name"),
        sale: row.get("sale"),
        size: row.get("size"),
        total_price: row.get("total_price"),
        nm_id: row.get("nm_id"),
        brand: row.get("brand"),
        status: row.get("status"),
    }
}
