use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::dimensions::{PAYMENT_METHOD_SEEDS, SHIPPING_METHOD_SEEDS};
use crate::error::Result;
use crate::types::{CustomerRecord, OrderItemRecord, OrderRecord, ProductRecord};

/// Deterministic stand-in for a source-system export. Same seed, same
/// anchor date, same files.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            customers: 5000,
            products: 500,
            orders: 20000,
            seed: 42,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratorSummary {
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
}

#[derive(Debug)]
pub struct Dataset {
    pub customers: Vec<CustomerRecord>,
    pub products: Vec<ProductRecord>,
    pub orders: Vec<OrderRecord>,
    pub order_items: Vec<OrderItemRecord>,
}

static FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Carlos", "Nancy", "Daniel", "Lisa", "Miguel", "Betty", "Anthony", "Margaret",
];

static LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
];

static CITIES: &[&str] = &[
    "Austin", "Columbus", "Denver", "Portland", "Raleigh", "Tucson", "Omaha", "Boise",
    "Madison", "Richmond", "Tampa", "Spokane", "Savannah", "Albany", "Fresno", "Wichita",
];

static STATES: &[&str] = &[
    "TX", "OH", "CO", "OR", "NC", "AZ", "NE", "ID", "WI", "VA", "FL", "WA", "GA", "NY", "CA",
    "KS",
];

static STREET_NAMES: &[&str] = &[
    "Oak", "Maple", "Cedar", "Pine", "Elm", "Walnut", "Willow", "Birch", "Juniper", "Aspen",
];

static STREET_SUFFIXES: &[&str] = &["St", "Ave", "Blvd", "Ln", "Dr", "Way"];

static CATEGORIES: &[&str] = &[
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Toys",
];

static PRODUCT_ADJECTIVES: &[&str] = &[
    "Classic", "Compact", "Deluxe", "Eco", "Essential", "Premium", "Portable", "Rugged",
    "Sleek", "Smart", "Ultra", "Vintage",
];

static PRODUCT_NOUNS: &[&str] = &[
    "Backpack", "Blender", "Camera", "Chair", "Headphones", "Jacket", "Kettle", "Lamp",
    "Monitor", "Notebook", "Racket", "Speaker", "Tent", "Watch",
];

static BRANDS: &[&str] = &[
    "Acme Goods", "Bluepeak", "Cobalt Works", "Duneline", "Everbright", "Foxglove Co",
    "Granite Labs", "Harbor Trade",
];

static SEGMENTS: &[&str] = &["Premium", "Standard", "Basic"];

/// Generate the four extracts and write them as CSV files into `data_dir`.
pub fn generate_all(config: &GeneratorConfig, data_dir: &Path) -> Result<GeneratorSummary> {
    let today = chrono::Utc::now().date_naive();
    let dataset = generate_dataset(config, today);
    write_dataset(&dataset, data_dir)?;

    let summary = GeneratorSummary {
        customers: dataset.customers.len(),
        products: dataset.products.len(),
        orders: dataset.orders.len(),
        order_items: dataset.order_items.len(),
    };
    info!(
        customers = summary.customers,
        products = summary.products,
        orders = summary.orders,
        order_items = summary.order_items,
        dir = %data_dir.display(),
        "Sample data written"
    );
    Ok(summary)
}

/// Build the dataset in memory. `today` anchors every generated date so the
/// output is a pure function of (config, today).
pub fn generate_dataset(config: &GeneratorConfig, today: NaiveDate) -> Dataset {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let customers = generate_customers(&mut rng, config.customers, today);
    let products = generate_products(&mut rng, config.products, today);
    let (orders, order_items) = generate_orders(&mut rng, config.orders, &customers, &products, today);

    Dataset {
        customers,
        products,
        orders,
        order_items,
    }
}

pub fn write_dataset(dataset: &Dataset, data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    write_csv(&data_dir.join("customers.csv"), &dataset.customers)?;
    write_csv(&data_dir.join("products.csv"), &dataset.products)?;
    write_csv(&data_dir.join("orders.csv"), &dataset.orders)?;
    write_csv(&data_dir.join("order_items.csv"), &dataset.order_items)?;
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn generate_customers(rng: &mut StdRng, count: usize, today: NaiveDate) -> Vec<CustomerRecord> {
    (1..=count as i32)
        .map(|customer_id| {
            let first_name = *pick(rng, FIRST_NAMES);
            let last_name = *pick(rng, LAST_NAMES);
            let city_index = rng.gen_range(0..CITIES.len());
            CustomerRecord {
                customer_id: Some(customer_id),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!(
                    "{}.{}{}@example.com",
                    first_name.to_lowercase(),
                    last_name.to_lowercase(),
                    customer_id
                ),
                phone: format!("555-{:04}", rng.gen_range(0..10_000)),
                address: format!(
                    "{} {} {}",
                    rng.gen_range(1..9999),
                    pick(rng, STREET_NAMES),
                    pick(rng, STREET_SUFFIXES)
                ),
                city: CITIES[city_index].to_string(),
                state: STATES[city_index % STATES.len()].to_string(),
                zip_code: format!("{:05}", rng.gen_range(10_000..99_999)),
                country: "USA".to_string(),
                registration_date: days_back(today, rng.gen_range(0..=730)),
                customer_segment: pick(rng, SEGMENTS).to_string(),
                // Roughly three in four customers stay active.
                is_active: rng.gen_range(0..4) < 3,
            }
        })
        .collect()
}

fn generate_products(rng: &mut StdRng, count: usize, today: NaiveDate) -> Vec<ProductRecord> {
    (1..=count as i32)
        .map(|product_id| {
            let category = *pick(rng, CATEGORIES);
            ProductRecord {
                product_id: Some(product_id),
                product_name: format!("{} {}", pick(rng, PRODUCT_ADJECTIVES), pick(rng, PRODUCT_NOUNS)),
                category: category.to_string(),
                sub_category: format!("{} - {}", category, pick(rng, PRODUCT_NOUNS)),
                brand: pick(rng, BRANDS).to_string(),
                price: round2(rng.gen_range(9.99..=999.99)),
                cost: round2(rng.gen_range(5.0..=500.0)),
                stock_quantity: rng.gen_range(0..=1000),
                supplier_id: rng.gen_range(1..=50),
                created_date: days_back(today, rng.gen_range(365..=1095)),
            }
        })
        .collect()
}

fn generate_orders(
    rng: &mut StdRng,
    count: usize,
    customers: &[CustomerRecord],
    products: &[ProductRecord],
    today: NaiveDate,
) -> (Vec<OrderRecord>, Vec<OrderItemRecord>) {
    let mut orders = Vec::with_capacity(count);
    let mut order_items = Vec::new();

    for order_id in 1..=count as i32 {
        let customer = &customers[rng.gen_range(0..customers.len())];
        let order_day = days_back(today, rng.gen_range(0..365));
        let order_time = NaiveTime::from_num_seconds_from_midnight_opt(rng.gen_range(0..86_400), 0)
            .unwrap_or(NaiveTime::MIN);
        let order_date = order_day.map(|day| day.and_time(order_time));

        let item_count = rng.gen_range(1..=5usize);
        let mut subtotal = 0.0;
        for (item_number, product_index) in
            rand::seq::index::sample(rng, products.len(), item_count.min(products.len()))
                .into_iter()
                .enumerate()
        {
            let product = &products[product_index];
            let quantity = rng.gen_range(1..=3);
            let line_total = round2(quantity as f64 * product.price);
            subtotal += line_total;
            order_items.push(OrderItemRecord {
                order_item_id: format!("{}_{}", order_id, item_number + 1),
                order_id,
                product_id: product.product_id.unwrap_or_default(),
                quantity,
                unit_price: product.price,
                line_total,
                discount_amount: 0.0,
            });
        }

        let shipping_cost = round2(rng.gen_range(0.0..=25.0));
        let tax_amount = round2(subtotal * 0.08);
        let raw_discount = if rng.gen_range(0.0..1.0) > 0.7 {
            round2(rng.gen_range(0.0..=50.0))
        } else {
            0.0
        };
        // A voucher never pushes an order total below zero.
        let discount_amount = raw_discount.min(round2(subtotal + tax_amount + shipping_cost));
        let total_amount = round2(subtotal + tax_amount + shipping_cost - discount_amount);

        orders.push(OrderRecord {
            order_id,
            customer_id: customer.customer_id.unwrap_or_default(),
            order_date,
            order_status: order_status(rng).to_string(),
            payment_method: pick_payment_method(rng),
            shipping_method: pick_shipping_method(rng),
            shipping_cost,
            tax_amount,
            discount_amount,
            total_amount,
            created_at: order_date,
            updated_at: order_date,
        });
    }

    (orders, order_items)
}

/// Completed 70%, Pending 15%, Cancelled 10%, Returned 5%.
fn order_status(rng: &mut StdRng) -> &'static str {
    match rng.gen_range(0..100) {
        0..=69 => "Completed",
        70..=84 => "Pending",
        85..=94 => "Cancelled",
        _ => "Returned",
    }
}

fn pick_payment_method(rng: &mut StdRng) -> String {
    PAYMENT_METHOD_SEEDS[rng.gen_range(0..PAYMENT_METHOD_SEEDS.len())]
        .payment_method
        .to_string()
}

fn pick_shipping_method(rng: &mut StdRng) -> String {
    SHIPPING_METHOD_SEEDS[rng.gen_range(0..SHIPPING_METHOD_SEEDS.len())]
        .shipping_method
        .to_string()
}

fn pick<'a, T>(rng: &mut StdRng, pool: &'a [T]) -> &'a T {
    &pool[rng.gen_range(0..pool.len())]
}

fn days_back(today: NaiveDate, days: u64) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(days))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
