//! Connectivity control
//!
//! TigerStyle: Platform toggling stays behind one trait.
//!
//! The engine never touches network interfaces directly. A platform layer
//! implements [`ConnectivityController`]; the executor only asks it to go
//! down and, later, to come back up.

use netmonkey_core::{Error, Result};
use std::sync::Arc;

/// Disables and re-enables network connectivity on behalf of the engine
pub trait ConnectivityController: Send + Sync + std::fmt::Debug {
    /// Whether the process may toggle connectivity at all
    fn has_permission(&self) -> bool;

    /// Take connectivity down, returning whether it succeeded
    fn disable(&self) -> bool;

    /// Bring connectivity back, returning whether it succeeded
    fn enable(&self) -> bool;
}

impl<T: ConnectivityController + ?Sized> ConnectivityController for Arc<T> {
    fn has_permission(&self) -> bool {
        (**self).has_permission()
    }

    fn disable(&self) -> bool {
        (**self).disable()
    }

    fn enable(&self) -> bool {
        (**self).enable()
    }
}

/// Controller for platforms without connectivity control
///
/// Never has permission, so every connectivity drop degrades to a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConnectivity;

impl ConnectivityController for NoConnectivity {
    fn has_permission(&self) -> bool {
        false
    }

    fn disable(&self) -> bool {
        false
    }

    fn enable(&self) -> bool {
        false
    }
}

/// Check permission, then take connectivity down
pub fn drop_connectivity(controller: &dyn ConnectivityController) -> Result<()> {
    if !controller.has_permission() || !controller.disable() {
        return Err(Error::permission_denied("connectivity.disable"));
    }
    Ok(())
}

/// Bring connectivity back
///
/// Permission is not consulted, so a link taken down by
/// [`drop_connectivity`] comes back even if permission was withdrawn since.
pub fn restore_connectivity(controller: &dyn ConnectivityController) -> Result<()> {
    if !controller.enable() {
        return Err(Error::internal("connectivity controller refused to enable"));
    }
    Ok(())
}
