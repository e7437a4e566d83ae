use std::env;

use anyhow::Result;
use chrono::NaiveDate;
use shopflow_core::db::{self, DbPool};
use shopflow_core::dimensions::DimensionLoader;
use shopflow_core::facts::FactLoader;
use tokio::runtime::Runtime;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

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

async fn seed_staging(pool: &DbPool) -> Result<()> {
    for (id, first, registered, segment) in [
        (1, "Ann", "2024-01-10", "Premium"),
        (2, "Bob", "2024-01-15", "Standard"),
    ] {
        sqlx::query(
            "INSERT INTO staging.customers \
             (customer_id, first_name, last_name, email, phone, address, city, state, \
              zip_code, country, registration_date, customer_segment, is_active) \
             VALUES ($1, $2, 'Tester', $3, '555-0000', '1 Main St', 'Austin', 'TX', \
                     '73301', 'USA', $4::date, $5, TRUE)",
        )
        .bind(id)
        .bind(first)
        .bind(format!("{}@example.com", first.to_lowercase()))
        .bind(registered)
        .bind(segment)
        .execute(pool)
        .await?;
    }

    for (id, name, price, cost) in [(1, "Desk Lamp", 10.00, 4.00), (2, "Tent", 25.50, 30.00)] {
        sqlx::query(
            "INSERT INTO staging.products \
             (product_id, product_name, category, sub_category, brand, price, cost, \
              stock_quantity, supplier_id, created_date) \
             VALUES ($1, $2, 'Home & Garden', 'Home & Garden - Misc', 'Acme Goods', \
                     $3, $4, 10, 1, '2023-06-01'::date)",
        )
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(cost)
        .execute(pool)
        .await?;
    }

    // Order 1: two staging items, one of which references an unknown product.
    // Order 2: no items at all.
    // Order 3: dated outside the pre-generated dimension range and paid with
    // a method the payment dimension does not know.
    for (id, customer, stamp, status, payment, shipping) in [
        (1, 1, "2024-01-20 10:00:00", "Completed", "Credit Card", "Standard"),
        (2, 2, "2024-01-21 16:30:00", "Pending", "PayPal", "Express"),
        (3, 1, "2024-02-05 09:15:00", "Completed", "Bitcoin", "Standard"),
    ] {
        sqlx::query(
            "INSERT INTO staging.orders \
             (order_id, customer_id, order_date, order_status, payment_method, \
              shipping_method, shipping_cost, tax_amount, discount_amount, total_amount, \
              created_at, updated_at) \
             VALUES ($1, $2, $3::timestamp, $4, $5, $6, 5.99, 1.60, 0, 27.59, \
                     $3::timestamp, $3::timestamp)",
        )
        .bind(id)
        .bind(customer)
        .bind(stamp)
        .bind(status)
        .bind(payment)
        .bind(shipping)
        .execute(pool)
        .await?;
    }

    for (item_id, order, product, quantity, unit_price, line_total) in [
        ("1_1", 1, 1, 2, 10.00, 20.00),
        ("1_2", 1, 99, 1, 5.00, 5.00),
        ("3_1", 3, 2, 1, 25.50, 25.50),
    ] {
        sqlx::query(
            "INSERT INTO staging.order_items \
             (order_item_id, order_id, product_id, quantity, unit_price, line_total, \
              discount_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, 0)",
        )
        .bind(item_id)
        .bind(order)
        .bind(product)
        .bind(quantity)
        .bind(unit_price)
        .bind(line_total)
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[test]
fn warehouse_load_end_to_end() -> Result<()> {
    let database_url = match env::var("SHOPFLOW_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping warehouse_load_end_to_end because SHOPFLOW_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let pool = db::connect_url(&database_url).await?;
        db::run_migrations(&pool).await?;
        reset(&pool).await?;
        seed_staging(&pool).await?;

        let start = date(2024, 1, 1);
        let end = date(2024, 1, 31);

        let dimensions = DimensionLoader::new(&pool);
        let dim_summary = dimensions.load_all(start, end).await?;
        assert_eq!(dim_summary.date_rows, 31);
        assert_eq!(dim_summary.payment_method_rows, 4);
        assert_eq!(dim_summary.shipping_method_rows, 3);
        assert_eq!(dim_summary.customer_rows, 2);
        assert_eq!(dim_summary.product_rows, 2);

        let facts = FactLoader::new(&pool);
        let fact_summary = facts.load_all().await?;
        // Order 3 is dated 2024-02-05, outside the generated range: exactly
        // one gap row gets added before the order loads.
        assert_eq!(fact_summary.dates_added, 1);
        assert_eq!(fact_summary.orders, 3);
        // Item 1_2 references an unknown product and is excluded; orders 1
        // and 3 contribute one loaded item each.
        assert_eq!(fact_summary.order_items, 2);

        let (day_name, day_of_week, week_of_year, quarter, is_weekend): (String, i16, i16, i16, bool) =
            sqlx::query_as(
                "SELECT day_name, day_of_week, week_of_year, quarter, is_weekend \
                 FROM warehouse.dim_date WHERE date_key = 20240205",
            )
            .fetch_one(&pool)
            .await?;
        assert_eq!(day_name, "Monday");
        assert_eq!(day_of_week, 0);
        assert_eq!(week_of_year, 6);
        assert_eq!(quarter, 1);
        assert!(!is_weekend);

        // Order 1's measures come from its staging items: both rows count
        // toward the quantity even though one is excluded from the item facts.
        let (order_quantity, subtotal): (i32, f64) = sqlx::query_as(
            "SELECT order_quantity, subtotal_amount::double precision \
             FROM warehouse.fact_orders WHERE order_id = 1",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(order_quantity, 2);
        assert!((subtotal - 25.00).abs() < 1e-9);

        // An order with no items still lands, with zeroed measures.
        let (zero_quantity, zero_subtotal): (i32, f64) = sqlx::query_as(
            "SELECT order_quantity, subtotal_amount::double precision \
             FROM warehouse.fact_orders WHERE order_id = 2",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(zero_quantity, 0);
        assert!((zero_subtotal - 0.0).abs() < 1e-9);

        // An unmatched payment method becomes a NULL surrogate key; the
        // customer reference still resolves.
        let (customer_key, payment_method_key): (Option<i32>, Option<i32>) = sqlx::query_as(
            "SELECT customer_key, payment_method_key \
             FROM warehouse.fact_orders WHERE order_id = 3",
        )
        .fetch_one(&pool)
        .await?;
        assert!(customer_key.is_some());
        assert!(payment_method_key.is_none());

        // Unit cost is snapshotted from the current product row and profit is
        // derived from it.
        let (unit_cost, line_total, profit): (f64, f64, f64) = sqlx::query_as(
            "SELECT foi.unit_cost::double precision, foi.line_total::double precision, \
                    foi.profit::double precision \
             FROM warehouse.fact_order_items foi \
             JOIN warehouse.fact_orders fo ON fo.order_key = foi.order_key \
             WHERE fo.order_id = 1",
        )
        .fetch_one(&pool)
        .await?;
        assert!((unit_cost - 4.00).abs() < 1e-9);
        assert!((line_total - 20.00).abs() < 1e-9);
        assert!((profit - 12.00).abs() < 1e-9);

        // Re-running everything with unchanged staging data inserts nothing.
        let second_dims = dimensions.load_all(start, end).await?;
        assert_eq!(second_dims.date_rows, 0);
        assert_eq!(second_dims.payment_method_rows, 0);
        assert_eq!(second_dims.shipping_method_rows, 0);
        assert_eq!(second_dims.customer_rows, 0);
        assert_eq!(second_dims.product_rows, 0);

        let second_facts = facts.load_all().await?;
        assert_eq!(second_facts.dates_added, 0);
        assert_eq!(second_facts.orders, 0);
        assert_eq!(second_facts.order_items, 0);

        // A customer added to staging between runs loads exactly once, and
        // already-seen keys stay untouched.
        sqlx::query(
            "INSERT INTO staging.customers \
             (customer_id, first_name, last_name, email, customer_segment, is_active, \
              registration_date) \
             VALUES (3, 'Cid', 'Newman', 'cid@example.com', 'Basic', TRUE, '2024-02-01'::date)",
        )
        .execute(&pool)
        .await?;
        assert_eq!(dimensions.load_customers().await?, 1);
        assert_eq!(dimensions.load_customers().await?, 0);

        let (duplicate_current,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM ( \
                 SELECT customer_id FROM warehouse.dim_customer \
                 WHERE is_current = TRUE GROUP BY customer_id HAVING COUNT(*) > 1 \
             ) duplicated",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(duplicate_current, 0);

        reset(&pool).await?;
        Ok(())
    })
}
