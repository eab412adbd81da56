use async_trait::async_trait;

use crate::settings::Settings;

/// Trait for delivering text reports to a messaging channel.
///
/// Delivery never raises: every failure is logged by the implementation and
/// reported as `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Sends `message` using the channel credentials in `settings`.
    async fn send(&self, settings: &Settings, message: &str) -> bool;
}
