use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Typed rows for the four staging extracts. The same structs serve the
/// sample-data generator (serialize) and the staging loader (deserialize), so
/// the written and accepted shapes cannot diverge.
///
/// Date and datetime columns are coerced: an unparseable value lands as NULL
/// in staging rather than failing the whole file, matching the source
/// loader's behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(deserialize_with = "de::lenient_date")]
    pub registration_date: Option<NaiveDate>,
    pub customer_segment: String,
    #[serde(deserialize_with = "de::lenient_bool")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: Option<i32>,
    pub product_name: String,
    pub category: String,
    pub sub_category: String,
    pub brand: String,
    pub price: f64,
    pub cost: f64,
    pub stock_quantity: i32,
    pub supplier_id: i32,
    #[serde(deserialize_with = "de::lenient_date")]
    pub created_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: i32,
    pub customer_id: i32,
    #[serde(deserialize_with = "de::lenient_datetime")]
    pub order_date: Option<NaiveDateTime>,
    pub order_status: String,
    pub payment_method: String,
    pub shipping_method: String,
    pub shipping_cost: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    #[serde(deserialize_with = "de::lenient_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "de::lenient_datetime")]
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub order_item_id: String,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
    pub discount_amount: f64,
}

pub(crate) mod de {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use serde::{Deserialize, Deserializer};

    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_datetime))
    }

    pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(parse_datetime)
            .map(|datetime| datetime.date()))
    }

    /// Accepts `true`/`false` in any casing plus `1`/`0`; extracts produced
    /// by pandas spell booleans `True`/`False`.
    pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean value '{other}'"
            ))),
        }
    }

    fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(datetime);
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN))
    }
}
