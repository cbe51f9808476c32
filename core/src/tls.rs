//! Process-wide record of whether encrypted transport is usable.
//!
//! # Design
//! The flag only ever moves from enabled to disabled, so concurrent
//! `disable` calls commute and no coordination beyond the store itself is
//! needed. A lost write costs one more certificate failure and another
//! downgrade on a later call.

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

use crate::store::FlagStore;

pub const SYSTEM_CONFIG_NAMESPACE: &str = "system_config";
pub const HTTPS_SUPPORT_KEY: &str = "https_support";

/// Shared gate over the persisted `https_support` flag.
#[derive(Clone)]
pub struct TlsCapabilityGate {
    store: Arc<dyn FlagStore>,
}

impl TlsCapabilityGate {
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self { store }
    }

    /// Whether requests may use `https`. Defaults to true until disabled.
    pub fn is_enabled(&self) -> bool {
        match self.store.get_bool(SYSTEM_CONFIG_NAMESPACE, HTTPS_SUPPORT_KEY) {
            Ok(flag) => flag.unwrap_or(true),
            Err(e) => {
                warn!(error = %e, "reading https support flag failed, assuming enabled");
                true
            }
        }
    }

    /// Permanently downgrade to plain `http`.
    pub fn disable(&self) {
        error!("certificate verification failed, disabling https");
        if let Err(e) = self
            .store
            .set_bool(SYSTEM_CONFIG_NAMESPACE, HTTPS_SUPPORT_KEY, false)
        {
            error!(error = %e, "persisting https downgrade failed");
        }
    }
}

impl fmt::Debug for TlsCapabilityGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsCapabilityGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
