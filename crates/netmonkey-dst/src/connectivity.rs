//! Simulated connectivity controller
//!
//! TigerStyle: Record every toggle, expose state for assertions.

use netmonkey_engine::ConnectivityController;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// In-memory connectivity switch
///
/// Starts connected with permission granted.
#[derive(Debug)]
pub struct SimConnectivity {
    permission: AtomicBool,
    /// Whether `disable` reports success
    disable_succeeds: AtomicBool,
    connected: watch::Sender<bool>,
    disable_count: AtomicU64,
    enable_count: AtomicU64,
}

impl Default for SimConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl SimConnectivity {
    pub fn new() -> Self {
        let (connected, _) = watch::channel(true);
        Self {
            permission: AtomicBool::new(true),
            disable_succeeds: AtomicBool::new(true),
            connected,
            disable_count: AtomicU64::new(0),
            enable_count: AtomicU64::new(0),
        }
    }

    /// Controller whose permission check fails
    pub fn without_permission() -> Self {
        let sim = Self::new();
        sim.set_permission(false);
        sim
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Make `disable` report failure while leaving the link up
    pub fn fail_disable(&self, fail: bool) {
        self.disable_succeeds.store(!fail, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Successful and failed `disable` calls
    pub fn disable_count(&self) -> u64 {
        self.disable_count.load(Ordering::SeqCst)
    }

    pub fn enable_count(&self) -> u64 {
        self.enable_count.load(Ordering::SeqCst)
    }

    /// Wait until connectivity is back up
    pub async fn wait_until_connected(&self) {
        let mut receiver = self.connected.subscribe();
        // The sender lives in self, so the channel cannot close while waiting
        let _ = receiver.wait_for(|connected| *connected).await;
    }
}

impl ConnectivityController for SimConnectivity {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn disable(&self) -> bool {
        self.disable_count.fetch_add(1, Ordering::SeqCst);
        if !self.disable_succeeds.load(Ordering::SeqCst) {
            return false;
        }
        self.connected.send_replace(false);
        tracing::debug!("Simulated connectivity disabled");
        true
    }

    fn enable(&self) -> bool {
        self.enable_count.fetch_add(1, Ordering::SeqCst);
        self.connected.send_replace(true);
        tracing::debug!("Simulated connectivity enabled");
        true
    }
}
