use serde::Serialize;
use tracing::{info, warn};

use crate::dates::{self, DimDateRow};
use crate::db::DbPool;
use crate::dimensions;
use crate::error::Result;

#[derive(Debug, Default, Serialize)]
pub struct FactSummary {
    pub dates_added: u64,
    pub orders: u64,
    pub order_items: u64,
}

/// Materializes order-grain and order-item-grain facts against current
/// dimension rows, exactly once per source business key. All state lives in
/// the warehouse tables; every operation is safely re-runnable.
pub struct FactLoader<'a> {
    pool: &'a DbPool,
}

impl<'a> FactLoader<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Reconcile dates, then orders, then order items, strictly in that
    /// order: an order's fact row must exist before its items can reference
    /// it, and a date row must exist before the order can.
    pub async fn load_all(&self) -> Result<FactSummary> {
        let dates_added = self.reconcile_missing_dates().await?;
        let orders = self.load_fact_orders().await?;
        let order_items = self.load_fact_order_items().await?;

        info!(dates_added, orders, order_items, "Fact load complete");
        Ok(FactSummary {
            dates_added,
            orders,
            order_items,
        })
    }

    /// Insert a dim_date row for every distinct order date staging knows but
    /// the warehouse does not. One insert per missing key, serially;
    /// `ON CONFLICT DO NOTHING` makes a concurrently-added key harmless.
    pub async fn reconcile_missing_dates(&self) -> Result<u64> {
        let missing: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT (TO_CHAR(order_date, 'YYYYMMDD'))::INTEGER AS date_key
            FROM staging.orders
            WHERE (TO_CHAR(order_date, 'YYYYMMDD'))::INTEGER NOT IN (
                SELECT date_key FROM warehouse.dim_date
            )
            ORDER BY date_key
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        if missing.is_empty() {
            info!("All order dates present in dim_date");
            return Ok(0);
        }

        warn!(count = missing.len(), "Order dates missing from dim_date, adding");
        let mut added = 0u64;
        for key in missing {
            let date = dates::date_from_key(key)?;
            added += dimensions::insert_date_row(self.pool, &DimDateRow::for_date(date)).await?;
        }

        info!(rows = added, "Added missing dates to dim_date");
        Ok(added)
    }

    /// One fact row per staging order not yet loaded whose date key exists.
    /// Order items aggregate through a left join, so an order with no items
    /// still lands with quantity 0 and subtotal 0. Dimension lookups are left
    /// joins as well: an unmatched customer, payment or shipping method
    /// yields a NULL surrogate key instead of dropping the order.
    pub async fn load_fact_orders(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO warehouse.fact_orders
                (order_id, order_date_key, customer_key, payment_method_key,
                 shipping_method_key, order_quantity, subtotal_amount,
                 shipping_cost, tax_amount, discount_amount, total_amount, order_status)
            SELECT
                o.order_id,
                (TO_CHAR(o.order_date, 'YYYYMMDD'))::INTEGER AS order_date_key,
                dc.customer_key,
                dpm.payment_method_key,
                dsm.shipping_method_key,
                COUNT(oi.order_item_id) AS order_quantity,
                COALESCE(SUM(oi.line_total), 0) AS subtotal_amount,
                o.shipping_cost,
                o.tax_amount,
                o.discount_amount,
                o.total_amount,
                o.order_status
            FROM staging.orders o
            LEFT JOIN staging.order_items oi ON o.order_id = oi.order_id
            LEFT JOIN warehouse.dim_customer dc
                ON o.customer_id = dc.customer_id AND dc.is_current = TRUE
            LEFT JOIN warehouse.dim_payment_method dpm
                ON o.payment_method = dpm.payment_method
            LEFT JOIN warehouse.dim_shipping_method dsm
                ON o.shipping_method = dsm.shipping_method
            WHERE o.order_id NOT IN (SELECT order_id FROM warehouse.fact_orders)
              AND (TO_CHAR(o.order_date, 'YYYYMMDD'))::INTEGER IN (
                  SELECT date_key FROM warehouse.dim_date
              )
            GROUP BY o.order_id, o.order_date, dc.customer_key,
                     dpm.payment_method_key, dsm.shipping_method_key,
                     o.shipping_cost, o.tax_amount, o.discount_amount,
                     o.total_amount, o.order_status
            "#,
        )
        .execute(self.pool)
        .await?;

        info!(rows = result.rows_affected(), "Loaded fact_orders");
        Ok(result.rows_affected())
    }

    /// One row per (order, product) line whose parent order has a fact row
    /// and whose product has a current dimension row; items referencing a
    /// product with no current row are excluded by the inner join. Unit cost
    /// is snapshotted from the current product version at load time.
    pub async fn load_fact_order_items(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO warehouse.fact_order_items
                (order_key, product_key, order_date_key, quantity, unit_price,
                 unit_cost, line_total, discount_amount, profit)
            SELECT
                fo.order_key,
                dp.product_key,
                fo.order_date_key,
                oi.quantity,
                oi.unit_price,
                COALESCE(dp.cost, 0) AS unit_cost,
                oi.line_total,
                oi.discount_amount,
                (oi.line_total - (COALESCE(dp.cost, 0) * oi.quantity)) AS profit
            FROM staging.order_items oi
            JOIN warehouse.fact_orders fo ON oi.order_id = fo.order_id
            JOIN warehouse.dim_product dp
                ON oi.product_id = dp.product_id AND dp.is_current = TRUE
            WHERE NOT EXISTS (
                SELECT 1 FROM warehouse.fact_order_items foi
                WHERE foi.order_key = fo.order_key
                  AND foi.product_key = dp.product_key
            )
            "#,
        )
        .execute(self.pool)
        .await?;

        info!(rows = result.rows_affected(), "Loaded fact_order_items");
        Ok(result.rows_affected())
    }
}
