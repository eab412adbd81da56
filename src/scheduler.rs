use chrono::{DateTime, Local};
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::analyzer::DiscrepancyAnalyzer;
use crate::config::AppConfig;
use crate::fetcher::PriceFetcher;
use crate::models::RunResult;
use crate::plugins::notifiers::TelegramNotifier;
use crate::plugins::traits::NotifierPlugin;
use crate::settings::{Settings, SettingsStore};
use crate::utils::error::{AppError, Result};

/// Observer invoked after every cycle and lifecycle change, on the worker task.
pub type UpdateCallback = Arc<dyn Fn(&RunResult) + Send + Sync>;

/// Periodic price checking engine.
///
/// Cloning is cheap and every clone drives the same engine. At most one
/// fetch/analyze/notify cycle runs at a time: manual runs are rejected with
/// [`AppError::CycleInProgress`] while a cycle is in flight, and the periodic
/// loop queues behind a manual run.
#[derive(Clone)]
pub struct PriceMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    store: SettingsStore,
    settings: RwLock<Settings>,
    fetcher: PriceFetcher,
    analyzer: DiscrepancyAnalyzer,
    notifier: Arc<dyn NotifierPlugin>,
    cycle_lock: Mutex<()>,
    // Some(run id) while the periodic loop with that id should keep going
    running: watch::Sender<Option<u64>>,
    next_run_id: AtomicU64,
    last_result: RwLock<Arc<RunResult>>,
    next_run_at: RwLock<Option<DateTime<Local>>>,
    update_callback: RwLock<Option<UpdateCallback>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl PriceMonitor {
    pub fn new(config: &AppConfig) -> Self {
        let notifier = Arc::new(TelegramNotifier::new(&config.telegram));
        Self::with_notifier(config, notifier)
    }

    pub fn with_notifier(config: &AppConfig, notifier: Arc<dyn NotifierPlugin>) -> Self {
        let store = SettingsStore::new(&config.settings_path);
        let settings = store.load();
        let (running, _) = watch::channel(None);

        Self {
            inner: Arc::new(MonitorInner {
                store,
                settings: RwLock::new(settings),
                fetcher: PriceFetcher::new(config.ozon.clone()),
                analyzer: DiscrepancyAnalyzer::new(&config.ozon.seller_url),
                notifier,
                cycle_lock: Mutex::new(()),
                running,
                next_run_id: AtomicU64::new(1),
                last_result: RwLock::new(Arc::new(RunResult::default())),
                next_run_at: RwLock::new(None),
                update_callback: RwLock::new(None),
                loop_handle: Mutex::new(None),
            }),
        }
    }

    pub async fn set_update_callback<F>(&self, callback: F)
    where
        F: Fn(&RunResult) + Send + Sync + 'static,
    {
        *self.inner.update_callback.write().await = Some(Arc::new(callback));
    }

    pub async fn last_result(&self) -> Arc<RunResult> {
        Arc::clone(&*self.inner.last_result.read().await)
    }

    /// When the periodic loop will start its next cycle, while it is waiting.
    pub async fn next_run_at(&self) -> Option<DateTime<Local>> {
        *self.inner.next_run_at.read().await
    }

    pub async fn settings(&self) -> Settings {
        self.inner.settings.read().await.clone()
    }

    /// Re-reads the settings store. Takes effect from the next cycle.
    pub async fn reload_settings(&self) -> Settings {
        let settings = self.inner.store.load();
        *self.inner.settings.write().await = settings.clone();
        info!("Configuration updated");
        settings
    }

    /// Validates, persists and activates new settings.
    pub async fn update_settings(&self, settings: Settings) -> Result<()> {
        settings.validate()?;
        if !self.inner.store.save(&settings) {
            return Err(AppError::Settings(format!(
                "failed to save settings to {}",
                self.inner.store.path().display()
            )));
        }
        *self.inner.settings.write().await = settings;
        info!("Configuration updated");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.borrow().is_some()
    }

    /// True while a cycle is in flight.
    pub fn is_checking(&self) -> bool {
        self.inner.cycle_lock.try_lock().is_err()
    }

    /// Runs exactly one cycle unless another one is already in flight.
    pub async fn run_once(&self) -> Result<RunResult> {
        let _guard = self.inner.cycle_lock.try_lock().map_err(|_| {
            warn!("Price check requested while another check is running");
            AppError::CycleInProgress
        })?;
        Ok(self.inner.execute_cycle().await)
    }

    /// Runs one cycle on a separate task so the caller is never blocked.
    pub fn trigger(&self) -> JoinHandle<Result<RunResult>> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run_once().await })
    }

    /// Starts the periodic loop. Returns `false` if it was already running.
    pub async fn start(&self) -> bool {
        let run_id = self.inner.next_run_id.fetch_add(1, Ordering::Relaxed);
        let started = self.inner.running.send_if_modified(|state| {
            if state.is_some() {
                false
            } else {
                *state = Some(run_id);
                true
            }
        });

        if !started {
            debug!("Monitoring already running");
            return false;
        }

        info!("Continuous monitoring started");
        self.inner.publish(RunResult::status("Monitoring started")).await;

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run_loop(run_id).await });
        *self.inner.loop_handle.lock().await = Some(handle);
        true
    }

    /// Stops the periodic loop. A cycle already in flight is allowed to finish.
    pub async fn stop(&self) -> bool {
        let stopped = self.inner.running.send_if_modified(|state| state.take().is_some());
        if !stopped {
            return false;
        }

        *self.inner.next_run_at.write().await = None;
        info!("Continuous monitoring stopped");
        self.inner.publish(RunResult::status("Monitoring stopped")).await;
        true
    }

    /// Stops the loop and waits for its task to finish.
    pub async fn shutdown(&self) {
        self.stop().await;
        let handle = self.inner.loop_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Monitoring loop ended abnormally: {}", e);
            }
        }
    }
}

impl MonitorInner {
    async fn run_loop(self: Arc<Self>, run_id: u64) {
        let mut state = self.running.subscribe();

        loop {
            if *state.borrow_and_update() != Some(run_id) {
                break;
            }

            {
                let _guard = self.cycle_lock.lock().await;
                // Stopped while queued behind a manual run
                if *state.borrow_and_update() != Some(run_id) {
                    break;
                }
                self.execute_cycle().await;
            }

            let interval = self.settings.read().await.interval();
            let next_run = chrono::Duration::from_std(interval)
                .ok()
                .and_then(|delay| Local::now().checked_add_signed(delay));
            if let Some(next_run) = next_run {
                info!("Next price check at {}", next_run.format("%H:%M:%S"));
            }
            *self.next_run_at.write().await = next_run;

            let stopped = tokio::select! {
                _ = tokio::time::sleep(interval) => false,
                _ = wait_until_stopped(&mut state, run_id) => true,
            };
            *self.next_run_at.write().await = None;
            if stopped {
                break;
            }
        }

        info!("Monitoring loop exited");
    }

    async fn execute_cycle(&self) -> RunResult {
        info!("Starting Ozon price monitoring");
        let settings = self.settings.read().await.clone();

        let result = match AssertUnwindSafe(self.check_prices(&settings))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Price check failed: {}", e);
                RunResult::failed(e.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                let error_msg = format!("Critical error in price monitoring: {}", reason);
                error!("{}", error_msg);

                let alert = format!("<b>❌ Price monitoring error</b>\n\n{}", error_msg);
                if AssertUnwindSafe(self.notifier.send(&settings, &alert))
                    .catch_unwind()
                    .await
                    .is_err()
                {
                    error!("Critical error alert could not be sent");
                }
                RunResult::failed(format!("Error: {}", reason))
            }
        };

        info!("Price monitoring completed: {}", result.message);
        self.publish(result.clone()).await;
        result
    }

    async fn check_prices(&self, settings: &Settings) -> Result<RunResult> {
        let page = self.fetcher.fetch(settings).await?;
        let report = self.analyzer.analyze(&page, settings)?;

        if !report.has_discrepancies() {
            info!("No price discrepancies found in {} products", report.products_checked);
            return Ok(RunResult::clean(&report));
        }

        let notified = self.notifier.send(settings, &report.render()).await;
        if notified {
            info!(
                "Price discrepancies found in {} products and notification sent",
                report.discrepancies.len()
            );
        } else {
            warn!(
                "Price discrepancies found in {} products but the notification failed",
                report.discrepancies.len()
            );
        }

        Ok(RunResult::discrepancies(&report, notified))
    }

    async fn publish(&self, result: RunResult) {
        let result = Arc::new(result);
        *self.last_result.write().await = Arc::clone(&result);

        let callback = self.update_callback.read().await.clone();
        if let Some(callback) = callback {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback(&result))) {
                error!("Status observer failed: {}", panic_message(panic.as_ref()));
            }
        }
    }
}

async fn wait_until_stopped(state: &mut watch::Receiver<Option<u64>>, run_id: u64) {
    loop {
        if *state.borrow_and_update() != Some(run_id) {
            return;
        }
        if state.changed().await.is_err() {
            return;
        }
    }
}

/// Formats the time left until a deadline as `HH:MM:SS`.
pub fn format_countdown(remaining: chrono::Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
