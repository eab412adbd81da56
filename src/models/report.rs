use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::PriceField;

pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// A product whose reported prices disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub offer_id: String,
    pub product_id: String,
    /// Compared fields with non-zero values, in comparison order.
    pub prices: Vec<(PriceField, Decimal)>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscrepancyReport {
    pub checked_at: DateTime<Local>,
    pub products_checked: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl DiscrepancyReport {
    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }

    pub fn timestamp(&self) -> String {
        self.checked_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Renders the report as Telegram HTML.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.discrepancies.len() + 2);
        parts.push(format!(
            "<b>⚠️ Price discrepancy report</b>\n<i>Checked at: {}</i>\n",
            self.timestamp()
        ));

        for discrepancy in &self.discrepancies {
            let mut block = format!(
                "<b>Product: {}</b> (ID: {})\n",
                escape_html(&discrepancy.offer_id),
                escape_html(&discrepancy.product_id)
            );
            for (field, value) in &discrepancy.prices {
                block.push_str(&format!("- {}: {} RUB\n", field.label(), value.normalize()));
            }
            block.push_str(&format!(
                "<a href='{}'>Open product in seller console</a>\n",
                discrepancy.url
            ));
            parts.push(block);
        }

        parts.push("\n<i>Please review the price settings of the listed products.</i>".to_string());
        parts.join("\n")
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Lifecycle status such as "started" or "stopped", not a check.
    Status,
    Clean,
    Discrepancies { count: usize, notified: bool },
    Failed,
}

/// What observers see after each cycle or lifecycle change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub message: String,
    pub outcome: CycleOutcome,
    pub at: DateTime<Local>,
}

impl RunResult {
    pub fn status(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            outcome: CycleOutcome::Status,
            at: Local::now(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            outcome: CycleOutcome::Failed,
            at: Local::now(),
        }
    }

    pub fn clean(report: &DiscrepancyReport) -> Self {
        Self {
            message: format!("No price discrepancies found ({})", report.timestamp()),
            outcome: CycleOutcome::Clean,
            at: report.checked_at,
        }
    }

    pub fn discrepancies(report: &DiscrepancyReport, notified: bool) -> Self {
        let count = report.discrepancies.len();
        let message = if notified {
            format!(
                "Price discrepancies found in {} products. Report sent to Telegram ({})",
                count,
                report.timestamp()
            )
        } else {
            format!(
                "Price discrepancies found in {} products. Telegram report was not delivered ({})",
                count,
                report.timestamp()
            )
        };
        Self {
            message,
            outcome: CycleOutcome::Discrepancies { count, notified },
            at: report.checked_at,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == CycleOutcome::Failed
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::status("Monitoring not started")
    }
}
