use std::env;

use anyhow::Result;
use chrono::NaiveDate;
use shopflow_core::db::{self, DbPool};
use shopflow_core::dimensions::DimensionLoader;
use shopflow_core::facts::FactLoader;
use shopflow_core::quality::QualityChecker;
use tokio::runtime::Runtime;

async fn reset(pool: &DbPool) -> Result<()> {
    sqlx::query(
        "TRUNCATE TABLE warehouse.fact_order_items, warehouse.fact_orders, \
         warehouse.dim_customer, warehouse.dim_product, warehouse.dim_payment_method, \
         warehouse.dim_shipping_method, warehouse.dim_date, staging.customers, \
         staging.products, staging.orders, staging.order_items \
         RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn seed_clean_staging(pool: &DbPool) -> Result<()> {
    sqlx::query(
        "INSERT INTO staging.customers \
         (customer_id, first_name, last_name, email, customer_segment, is_active, \
          registration_date) \
         VALUES (1, 'Ann', 'Tester', 'ann@example.com', 'Premium', TRUE, '2024-01-10'::date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO staging.products \
         (product_id, product_name, category, sub_category, brand, price, cost, \
          stock_quantity, supplier_id, created_date) \
         VALUES (1, 'Desk Lamp', 'Home & Garden', 'Home & Garden - Lighting', 'Acme Goods', \
                 10.00, 4.00, 10, 1, '2023-06-01'::date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO staging.orders \
         (order_id, customer_id, order_date, order_status, payment_method, shipping_method, \
          shipping_cost, tax_amount, discount_amount, total_amount, created_at, updated_at) \
         VALUES (1, 1, '2024-01-20 10:00:00'::timestamp, 'Completed', 'Credit Card', \
                 'Standard', 5.99, 1.60, 0, 27.59, '2024-01-20 10:00:00'::timestamp, \
                 '2024-01-20 10:00:00'::timestamp)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO staging.order_items \
         (order_item_id, order_id, product_id, quantity, unit_price, line_total, \
          discount_amount) \
         VALUES ('1_1', 1, 1, 2, 10.00, 20.00, 0)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[test]
fn quality_report_reflects_warehouse_state() -> Result<()> {
    let database_url = match env::var("SHOPFLOW_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping quality_report_reflects_warehouse_state because \
                 SHOPFLOW_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let pool = db::connect_url(&database_url).await?;
        db::run_migrations(&pool).await?;
        reset(&pool).await?;
        seed_clean_staging(&pool).await?;

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date");
        DimensionLoader::new(&pool).load_all(start, end).await?;
        FactLoader::new(&pool).load_all().await?;

        let checker = QualityChecker::new(&pool);
        let report = checker.run_all_checks().await?;
        assert!(report.all_passed(), "clean load should pass: {report:?}");
        assert_eq!(report.checks.len(), 5);

        // A dirty staging row flips the staging check without touching the
        // warehouse-side checks.
        sqlx::query(
            "INSERT INTO staging.customers \
             (customer_id, first_name, last_name, email, customer_segment, is_active, \
              registration_date) \
             VALUES (1, 'Ann', 'Duplicate', 'no-at-sign.example.com', 'Gold', TRUE, \
                     '2024-01-11'::date)",
        )
        .execute(&pool)
        .await?;

        let dirty = checker.run_all_checks().await?;
        assert!(!dirty.all_passed());

        let staging_customers = dirty
            .checks
            .iter()
            .find(|check| check.name == "staging_customers")
            .expect("staging_customers check present");
        assert!(!staging_customers.passed);

        let failed: Vec<&str> = staging_customers
            .rules
            .iter()
            .filter(|rule| rule.status == shopflow_core::quality::RuleStatus::Failed)
            .map(|rule| rule.rule)
            .collect();
        assert!(failed.contains(&"duplicate customer ids"));
        assert!(failed.contains(&"invalid emails"));
        assert!(failed.contains(&"segments outside allowed set"));

        let fact_orders = dirty
            .checks
            .iter()
            .find(|check| check.name == "fact_orders")
            .expect("fact_orders check present");
        assert!(fact_orders.passed);

        reset(&pool).await?;
        Ok(())
    })
}
