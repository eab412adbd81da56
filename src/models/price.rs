//! Wire types of the seller pricing API.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// One page of the `/v5/product/info/prices` response.
///
/// `items` stays optional so that a response without it can be told apart
/// from an empty page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiPage {
    #[serde(default)]
    pub items: Option<Vec<PriceItem>>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub total: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceItem {
    #[serde(default)]
    pub offer_id: String,
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub product_id: String,
    #[serde(default)]
    pub price: ItemPrice,
}

/// Price block of a product. Missing fields read as zero, which means
/// "not reported".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemPrice {
    #[serde(default, deserialize_with = "price_from_string_or_number")]
    pub marketing_seller_price: Decimal,
    #[serde(default, deserialize_with = "price_from_string_or_number")]
    pub min_price: Decimal,
    #[serde(default, deserialize_with = "price_from_string_or_number")]
    pub marketing_price: Decimal,
    #[serde(default, deserialize_with = "price_from_string_or_number")]
    pub price: Decimal,
}

/// Price fields that take part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    MarketingSellerPrice,
    MinPrice,
    MarketingPrice,
    Price,
}

impl PriceField {
    pub fn key(&self) -> &'static str {
        match self {
            PriceField::MarketingSellerPrice => "marketing_seller_price",
            PriceField::MinPrice => "min_price",
            PriceField::MarketingPrice => "marketing_price",
            PriceField::Price => "price",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceField::MarketingSellerPrice => "Price (marketing_seller_price)",
            PriceField::MinPrice => "Minimum price (min_price)",
            PriceField::MarketingPrice => "Ozon price (marketing_price)",
            PriceField::Price => "Ozon price 2 (price)",
        }
    }
}

impl ItemPrice {
    pub fn get(&self, field: PriceField) -> Decimal {
        match field {
            PriceField::MarketingSellerPrice => self.marketing_seller_price,
            PriceField::MinPrice => self.min_price,
            PriceField::MarketingPrice => self.marketing_price,
            PriceField::Price => self.price,
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number for product id, got {}",
            other
        ))),
    }
}

fn price_from_string_or_number<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(serde_json::Value::Null) => return Ok(Decimal::ZERO),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(Decimal::ZERO),
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected string or number for price, got {}",
                other
            )));
        }
    };

    Decimal::from_str(text.trim())
        .or_else(|_| Decimal::from_scientific(text.trim()))
        .map_err(|e| serde::de::Error::custom(format!("invalid price '{}': {}", text, e)))
}
