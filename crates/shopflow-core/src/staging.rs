use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::DbPool;
use crate::error::{PipelineError, Result};
use crate::types::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};

#[derive(Debug, Serialize)]
pub struct TableLoad {
    pub table: &'static str,
    pub rows: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct StagingSummary {
    pub tables: Vec<TableLoad>,
}

impl StagingSummary {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|load| load.rows).sum()
    }
}

/// Replaces the staging tables wholesale from the CSV extracts in a data
/// directory. Each table is truncated and reloaded inside one transaction, so
/// downstream loaders never observe a half-written staging state.
pub struct StagingLoader<'a> {
    pool: &'a DbPool,
}

impl<'a> StagingLoader<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Scan `data_dir` for `*.csv` files and load each recognized extract.
    /// File stems map to staging tables; anything else is skipped with a
    /// warning.
    pub async fn load_all_sources(&self, data_dir: &Path) -> Result<StagingSummary> {
        if !data_dir.is_dir() {
            return Err(PipelineError::Precondition(format!(
                "data directory {} not found; run `shopflow generate` first",
                data_dir.display()
            )));
        }

        let pattern = data_dir.join("*.csv");
        let pattern = pattern.to_string_lossy();

        let mut summary = StagingSummary::default();
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|err| PipelineError::Io(err.into_error()))?;
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();

            let load = match stem.as_str() {
                "customers" => TableLoad {
                    table: "customers",
                    rows: self.load_customers(&path).await?,
                },
                "products" => TableLoad {
                    table: "products",
                    rows: self.load_products(&path).await?,
                },
                "orders" => TableLoad {
                    table: "orders",
                    rows: self.load_orders(&path).await?,
                },
                "order_items" => TableLoad {
                    table: "order_items",
                    rows: self.load_order_items(&path).await?,
                },
                _ => {
                    warn!(file = %path.display(), "No staging table for file, skipping");
                    continue;
                }
            };
            summary.tables.push(load);
        }

        if summary.tables.is_empty() {
            return Err(PipelineError::Precondition(format!(
                "no CSV extracts found in {}; run `shopflow generate` first",
                data_dir.display()
            )));
        }

        info!(
            tables = summary.tables.len(),
            rows = summary.total_rows(),
            "Staging load complete"
        );
        Ok(summary)
    }

    async fn load_customers(&self, path: &Path) -> Result<u64> {
        let records: Vec<CustomerRecord> = read_records(path)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE TABLE staging.customers")
            .execute(&mut *tx)
            .await?;
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO staging.customers
                    (customer_id, first_name, last_name, email, phone, address,
                     city, state, zip_code, country, registration_date,
                     customer_segment, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(record.customer_id)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(&record.address)
            .bind(&record.city)
            .bind(&record.state)
            .bind(&record.zip_code)
            .bind(&record.country)
            .bind(record.registration_date)
            .bind(&record.customer_segment)
            .bind(record.is_active)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(rows = records.len(), "Loaded staging.customers");
        Ok(records.len() as u64)
    }

    async fn load_products(&self, path: &Path) -> Result<u64> {
        let records: Vec<ProductRecord> = read_records(path)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE TABLE staging.products")
            .execute(&mut *tx)
            .await?;
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO staging.products
                    (product_id, product_name, category, sub_category, brand,
                     price, cost, stock_quantity, supplier_id, created_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(record.product_id)
            .bind(&record.product_name)
            .bind(&record.category)
            .bind(&record.sub_category)
            .bind(&record.brand)
            .bind(record.price)
            .bind(record.cost)
            .bind(record.stock_quantity)
            .bind(record.supplier_id)
            .bind(record.created_date)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(rows = records.len(), "Loaded staging.products");
        Ok(records.len() as u64)
    }

    async fn load_orders(&self, path: &Path) -> Result<u64> {
        let records: Vec<OrderRecord> = read_records(path)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE TABLE staging.orders")
            .execute(&mut *tx)
            .await?;
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO staging.orders
                    (order_id, customer_id, order_date, order_status,
                     payment_method, shipping_method, shipping_cost, tax_amount,
                     discount_amount, total_amount, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(record.order_id)
            .bind(record.customer_id)
            .bind(record.order_date)
            .bind(&record.order_status)
            .bind(&record.payment_method)
            .bind(&record.shipping_method)
            .bind(record.shipping_cost)
            .bind(record.tax_amount)
            .bind(record.discount_amount)
            .bind(record.total_amount)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(rows = records.len(), "Loaded staging.orders");
        Ok(records.len() as u64)
    }

    async fn load_order_items(&self, path: &Path) -> Result<u64> {
        let records: Vec<OrderItemRecord> = read_records(path)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE TABLE staging.order_items")
            .execute(&mut *tx)
            .await?;
        for record in &records {
            sqlx::query(
                r#"
                INSERT INTO staging.order_items
                    (order_item_id, order_id, product_id, quantity,
                     unit_price, line_total, discount_amount)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&record.order_item_id)
            .bind(record.order_id)
            .bind(record.product_id)
            .bind(record.quantity)
            .bind(record.unit_price)
            .bind(record.line_total)
            .bind(record.discount_amount)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(rows = records.len(), "Loaded staging.order_items");
        Ok(records.len() as u64)
    }
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductRecord;

    #[test]
    fn read_records_surfaces_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(
            &path,
            "product_id,product_name,category,sub_category,brand,price,cost,stock_quantity,supplier_id,created_date\n\
             1,Lamp,Home,Home - Lamp,Acme,19.99,not-a-number,5,1,2023-01-01\n",
        )
        .unwrap();

        let result: Result<Vec<ProductRecord>> = read_records(&path);
        assert!(result.is_err());
    }

    #[test]
    fn read_records_parses_clean_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(
            &path,
            "product_id,product_name,category,sub_category,brand,price,cost,stock_quantity,supplier_id,created_date\n\
             1,Lamp,Home,Home - Lamp,Acme,19.99,8.50,5,1,2023-01-01\n\
             2,Tent,Sports,Sports - Tent,Dune,99.99,40.00,2,3,2022-07-15\n",
        )
        .unwrap();

        let rows: Vec<ProductRecord> = read_records(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].product_id, Some(2));
        assert_eq!(rows[1].cost, 40.0);
    }
}
