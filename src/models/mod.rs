pub mod price;
pub mod report;

// Re-exports for convenience
pub use price::*;
pub use report::*;
