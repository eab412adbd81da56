pub mod analyzer;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod settings;
pub mod utils;

// Re-export commonly used types
pub use analyzer::DiscrepancyAnalyzer;
pub use crate::config::AppConfig;
pub use fetcher::PriceFetcher;
pub use plugins::{NotifierPlugin, TelegramNotifier};
pub use scheduler::PriceMonitor;
pub use settings::{Settings, SettingsStore, Visibility};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
