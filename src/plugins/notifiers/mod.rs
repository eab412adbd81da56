// Notifier plugin implementations
pub mod telegram;

pub use telegram::{TelegramNotifier, split_message};
