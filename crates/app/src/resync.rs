//! Full resync: ask the bus for the status of every readable address so the
//! state store catches up after startup or a reconnect.
//!
//! The driver only sends read requests. Answers arrive as ordinary response
//! telegrams and flow through the dispatcher like any other observation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

use knxhub_domain::catalog::DeviceCatalog;
use knxhub_domain::error::HubError;

use crate::bus_handle::BusHandle;
use crate::ports::BusConnection;

#[derive(Debug, Clone, Copy)]
pub struct ResyncConfig {
    /// Upper bound for a single read request.
    pub read_timeout: Duration,
    /// Pause between two devices.
    pub pace: Duration,
}

impl Default for ResyncConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(3000),
            pace: Duration::from_millis(200),
        }
    }
}

/// Counters of one resync run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResyncReport {
    pub requested: usize,
    pub timed_out: usize,
    pub failed: usize,
    /// The bus went away mid-run and the remaining devices were skipped.
    pub aborted: bool,
}

/// Sends one read request per readable address of the catalog.
pub struct ResyncDriver<C> {
    catalog: Arc<DeviceCatalog>,
    bus: BusHandle<C>,
    config: ResyncConfig,
    running: Arc<AtomicBool>,
}

impl<C> Clone for ResyncDriver<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            bus: self.bus.clone(),
            config: self.config,
            running: Arc::clone(&self.running),
        }
    }
}

/// Clears the running flag when a run finishes, even if it is aborted.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<C: BusConnection + 'static> ResyncDriver<C> {
    pub fn new(catalog: Arc<DeviceCatalog>, bus: BusHandle<C>, config: ResyncConfig) -> Self {
        Self {
            catalog,
            bus,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn a resync run, unless one is already in progress.
    pub fn start(&self) -> Option<JoinHandle<ResyncReport>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("resync already running");
            return None;
        }
        let guard = RunGuard(Arc::clone(&self.running));
        let driver = self.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            driver.resync_all().await
        }))
    }

    /// Walk the catalog and request every readable address.
    ///
    /// A timed out request is logged and the walk goes on. Losing the bus
    /// stops the walk.
    pub async fn resync_all(&self) -> ResyncReport {
        let mut report = ResyncReport::default();
        let mut first = true;

        tracing::info!(devices = self.catalog.len(), "starting full resync");
        for device in self.catalog.devices() {
            let addresses: Vec<_> = device.readable_addresses().collect();
            if addresses.is_empty() {
                continue;
            }
            if !first {
                tokio::time::sleep(self.config.pace).await;
            }
            first = false;

            for (role, address) in addresses {
                match self.bus.read(address, self.config.read_timeout).await {
                    Ok(()) => report.requested += 1,
                    Err(HubError::Timeout { .. }) => {
                        report.timed_out += 1;
                        tracing::warn!(device_id = %device.id, %role, %address, "read request timed out");
                    }
                    Err(err) if err.is_bus_unavailable() => {
                        report.aborted = true;
                        tracing::warn!(device_id = %device.id, "bus unavailable, aborting resync");
                        return report;
                    }
                    Err(err) => {
                        report.failed += 1;
                        tracing::warn!(%err, device_id = %device.id, %role, %address, "read request failed");
                    }
                }
            }
        }
        tracing::info!(
            requested = report.requested,
            timed_out = report.timed_out,
            failed = report.failed,
            "full resync finished"
        );
        report
    }
}
