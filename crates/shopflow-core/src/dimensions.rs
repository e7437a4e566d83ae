use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::dates::{self, DimDateRow};
use crate::db::DbPool;
use crate::error::{PipelineError, Result};

#[derive(Debug)]
pub struct PaymentMethodSeed {
    pub payment_method: &'static str,
    pub payment_type: &'static str,
    pub processing_fee_pct: f64,
}

pub static PAYMENT_METHOD_SEEDS: &[PaymentMethodSeed] = &[
    PaymentMethodSeed {
        payment_method: "Credit Card",
        payment_type: "Card",
        processing_fee_pct: 2.5,
    },
    PaymentMethodSeed {
        payment_method: "PayPal",
        payment_type: "Digital",
        processing_fee_pct: 3.0,
    },
    PaymentMethodSeed {
        payment_method: "Debit Card",
        payment_type: "Card",
        processing_fee_pct: 2.0,
    },
    PaymentMethodSeed {
        payment_method: "Gift Card",
        payment_type: "Card",
        processing_fee_pct: 0.0,
    },
];

#[derive(Debug)]
pub struct ShippingMethodSeed {
    pub shipping_method: &'static str,
    pub estimated_days: i32,
    pub base_cost: f64,
}

pub static SHIPPING_METHOD_SEEDS: &[ShippingMethodSeed] = &[
    ShippingMethodSeed {
        shipping_method: "Standard",
        estimated_days: 5,
        base_cost: 5.99,
    },
    ShippingMethodSeed {
        shipping_method: "Express",
        estimated_days: 3,
        base_cost: 12.99,
    },
    ShippingMethodSeed {
        shipping_method: "Next Day",
        estimated_days: 1,
        base_cost: 24.99,
    },
];

/// Rows inserted per dimension during one load pass. Skipped loads report 0.
#[derive(Debug, Default, Serialize)]
pub struct DimensionSummary {
    pub date_rows: u64,
    pub payment_method_rows: u64,
    pub shipping_method_rows: u64,
    pub customer_rows: u64,
    pub product_rows: u64,
}

/// Brings the warehouse dimensions up to date from staging without touching
/// already-loaded history. Every operation is idempotent: what exists in the
/// target table decides what gets inserted, never an in-memory checkpoint.
pub struct DimensionLoader<'a> {
    pool: &'a DbPool,
}

impl<'a> DimensionLoader<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Fixed load order: date, payment methods, shipping methods, customers,
    /// products. The order only matters for deterministic logs; any failure
    /// aborts the whole phase.
    pub async fn load_all(&self, start: NaiveDate, end: NaiveDate) -> Result<DimensionSummary> {
        let summary = DimensionSummary {
            date_rows: self.load_date_dimension(start, end).await?,
            payment_method_rows: self.load_payment_methods().await?,
            shipping_method_rows: self.load_shipping_methods().await?,
            customer_rows: self.load_customers().await?,
            product_rows: self.load_products().await?,
        };
        info!(
            customers = summary.customer_rows,
            products = summary.product_rows,
            "Dimension load complete"
        );
        Ok(summary)
    }

    /// Generate one row per calendar day in `[start, end]`. Skipped entirely
    /// when the table already has rows: idempotence is an existence check,
    /// not a range check, so re-running with a different range is a no-op.
    pub async fn load_date_dimension(&self, start: NaiveDate, end: NaiveDate) -> Result<u64> {
        if start > end {
            return Err(PipelineError::Validation(format!(
                "date dimension range is inverted: {start} > {end}"
            )));
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM warehouse.dim_date")
            .fetch_one(self.pool)
            .await?;
        if existing > 0 {
            info!(rows = existing, "dim_date already populated, skipping");
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for date in dates::days_inclusive(start, end) {
            inserted += insert_date_row(&mut *tx, &DimDateRow::for_date(date)).await?;
        }
        tx.commit().await?;

        info!(rows = inserted, %start, %end, "Loaded dim_date");
        Ok(inserted)
    }

    pub async fn load_payment_methods(&self) -> Result<u64> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM warehouse.dim_payment_method")
            .fetch_one(self.pool)
            .await?;
        if existing > 0 {
            info!(rows = existing, "dim_payment_method already seeded, skipping");
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for seed in PAYMENT_METHOD_SEEDS {
            sqlx::query(
                r#"
                INSERT INTO warehouse.dim_payment_method
                    (payment_method, payment_type, processing_fee_pct)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(seed.payment_method)
            .bind(seed.payment_type)
            .bind(seed.processing_fee_pct)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(rows = PAYMENT_METHOD_SEEDS.len(), "Loaded dim_payment_method");
        Ok(PAYMENT_METHOD_SEEDS.len() as u64)
    }

    pub async fn load_shipping_methods(&self) -> Result<u64> {
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM warehouse.dim_shipping_method")
                .fetch_one(self.pool)
                .await?;
        if existing > 0 {
            info!(rows = existing, "dim_shipping_method already seeded, skipping");
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for seed in SHIPPING_METHOD_SEEDS {
            sqlx::query(
                r#"
                INSERT INTO warehouse.dim_shipping_method
                    (shipping_method, estimated_days, base_cost)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(seed.shipping_method)
            .bind(seed.estimated_days)
            .bind(seed.base_cost)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(
            rows = SHIPPING_METHOD_SEEDS.len(),
            "Loaded dim_shipping_method"
        );
        Ok(SHIPPING_METHOD_SEEDS.len() as u64)
    }

    /// Append every staging customer whose business key has no current
    /// dimension row. New rows open at the registration date and stay open.
    /// Known keys are left untouched even when their attributes changed.
    pub async fn load_customers(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO warehouse.dim_customer
                (customer_id, first_name, last_name, email, phone, address,
                 city, state, zip_code, country, customer_segment, is_active,
                 registration_date, effective_date, end_date, is_current)
            SELECT
                customer_id,
                first_name,
                last_name,
                email,
                phone,
                address,
                city,
                state,
                zip_code,
                country,
                customer_segment,
                is_active,
                registration_date,
                registration_date AS effective_date,
                NULL AS end_date,
                TRUE AS is_current
            FROM staging.customers
            WHERE customer_id NOT IN (
                SELECT customer_id
                FROM warehouse.dim_customer
                WHERE is_current = TRUE
            )
            "#,
        )
        .execute(self.pool)
        .await?;

        info!(rows = result.rows_affected(), "Loaded dim_customer");
        Ok(result.rows_affected())
    }

    /// Same append-only policy as customers, keyed on product_id.
    pub async fn load_products(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO warehouse.dim_product
                (product_id, product_name, category, sub_category, brand,
                 price, cost, effective_date, end_date, is_current)
            SELECT
                product_id,
                product_name,
                category,
                sub_category,
                brand,
                price,
                cost,
                created_date AS effective_date,
                NULL AS end_date,
                TRUE AS is_current
            FROM staging.products
            WHERE product_id NOT IN (
                SELECT product_id
                FROM warehouse.dim_product
                WHERE is_current = TRUE
            )
            "#,
        )
        .execute(self.pool)
        .await?;

        info!(rows = result.rows_affected(), "Loaded dim_product");
        Ok(result.rows_affected())
    }
}

/// Insert one derived date row, ignoring an already-present key. Used by the
/// bulk date load above and by the fact loader's gap filling.
pub(crate) async fn insert_date_row<'e, E>(executor: E, row: &DimDateRow) -> Result<u64>
where
    E: sqlx::postgres::PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO warehouse.dim_date
            (date_key, date, day_of_week, day_name, day_of_month,
             day_of_year, week_of_year, month, month_name, quarter,
             year, is_weekend, is_holiday)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (date_key) DO NOTHING
        "#,
    )
    .bind(row.date_key)
    .bind(row.date)
    .bind(row.day_of_week)
    .bind(row.day_name)
    .bind(row.day_of_month)
    .bind(row.day_of_year)
    .bind(row.week_of_year)
    .bind(row.month)
    .bind(row.month_name)
    .bind(row.quarter)
    .bind(row.year)
    .bind(row.is_weekend)
    .bind(row.is_holiday)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
