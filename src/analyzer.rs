//! Price discrepancy detection.
//!
//! For each product the seller price is always compared; `min_price`,
//! `marketing_price` and `price` join the comparison when their settings flag
//! is on. Zero means the marketplace did not report the field, so zeros are
//! dropped before comparing. A product is a discrepancy when more than one
//! distinct value remains.

use chrono::Local;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::models::{ApiPage, Discrepancy, DiscrepancyReport, PriceField, PriceItem};
use crate::settings::Settings;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct DiscrepancyAnalyzer {
    seller_url: String,
}

impl DiscrepancyAnalyzer {
    pub fn new(seller_url: impl Into<String>) -> Self {
        Self {
            seller_url: seller_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fields compared for every product under the given settings.
    pub fn enabled_fields(settings: &Settings) -> Vec<PriceField> {
        let mut fields = vec![PriceField::MarketingSellerPrice];
        if settings.check_min_price {
            fields.push(PriceField::MinPrice);
        }
        if settings.check_marketing_price {
            fields.push(PriceField::MarketingPrice);
        }
        if settings.check_price {
            fields.push(PriceField::Price);
        }
        fields
    }

    pub fn product_url(&self, product_id: &str) -> String {
        format!("{}/app/products/card/{}", self.seller_url, product_id)
    }

    pub fn analyze(&self, page: &ApiPage, settings: &Settings) -> Result<DiscrepancyReport> {
        let items = page
            .items
            .as_ref()
            .ok_or_else(|| AppError::AnalysisData("no data to analyze".to_string()))?;

        let fields = Self::enabled_fields(settings);
        let discrepancies = items
            .iter()
            .filter_map(|item| self.check_item(item, &fields))
            .collect();

        Ok(DiscrepancyReport {
            checked_at: Local::now(),
            products_checked: items.len(),
            discrepancies,
        })
    }

    fn check_item(&self, item: &PriceItem, fields: &[PriceField]) -> Option<Discrepancy> {
        let prices: Vec<(PriceField, Decimal)> = fields
            .iter()
            .map(|field| (*field, item.price.get(*field)))
            .filter(|(_, value)| !value.is_zero())
            .collect();

        let distinct: HashSet<Decimal> =
            prices.iter().map(|(_, value)| value.normalize()).collect();
        if distinct.len() <= 1 {
            return None;
        }

        Some(Discrepancy {
            offer_id: item.offer_id.clone(),
            product_id: item.product_id.clone(),
            prices,
            url: self.product_url(&item.product_id),
        })
    }
}
