//! # Global Hook Installer
//!
//! Installs the multiplexer into both host hook slots exactly once. The host
//! forbids a second assignment, so the installer never attempts one: not on
//! concurrent first calls, not after every tenant unregisters, and not after
//! a failed attempt.

use super::host::{ContentHandlerFactory, HostRuntime, SchemeHandlerFactory};
use super::multiplexer::HandlerMultiplexer;
use crate::error::{MuxError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallState {
    /// Neither hook has been touched
    Uninstalled = 0,
    /// Both hooks point at the multiplexer
    Installed = 1,
    /// An attempt was made and the host refused; never retried
    Failed = 2,
}

impl From<u8> for InstallState {
    fn from(value: u8) -> Self {
        match value {
            0 => InstallState::Uninstalled,
            1 => InstallState::Installed,
            _ => InstallState::Failed,
        }
    }
}

pub struct GlobalHookInstaller {
    state: AtomicU8,
    install_lock: Mutex<()>,
    host: Arc<dyn HostRuntime>,
    multiplexer: Arc<HandlerMultiplexer>,
}

impl fmt::Debug for GlobalHookInstaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalHookInstaller")
            .field("state", &self.state())
            .field("host", &"Arc<dyn HostRuntime>")
            .field("multiplexer", &"Arc<HandlerMultiplexer>")
            .finish()
    }
}

impl GlobalHookInstaller {
    pub fn new(host: Arc<dyn HostRuntime>, multiplexer: Arc<HandlerMultiplexer>) -> Self {
        Self {
            state: AtomicU8::new(InstallState::Uninstalled as u8),
            install_lock: Mutex::new(()),
            host,
            multiplexer,
        }
    }

    pub fn state(&self) -> InstallState {
        InstallState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_installed(&self) -> bool {
        self.state() == InstallState::Installed
    }

    /// Install both hooks unless already done. Safe to call repeatedly and
    /// concurrently; when it returns `Ok`, the hooks are live for every
    /// thread.
    pub fn ensure_installed(&self) -> Result<()> {
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        let _guard = self.install_lock.lock();
        if let Some(outcome) = self.settled() {
            return outcome;
        }

        let scheme_factory: Arc<dyn SchemeHandlerFactory> = Arc::clone(&self.multiplexer) as _;
        let content_factory: Arc<dyn ContentHandlerFactory> = Arc::clone(&self.multiplexer) as _;

        let outcome = self
            .host
            .set_scheme_handler_factory(scheme_factory)
            .and_then(|()| self.host.set_content_handler_factory(content_factory));

        match outcome {
            Ok(()) => {
                self.state
                    .store(InstallState::Installed as u8, Ordering::Release);
                info!("Scheme and content handler factories installed into host runtime");
                Ok(())
            }
            Err(e) => {
                self.state.store(InstallState::Failed as u8, Ordering::Release);
                error!(error = %e, "Host runtime rejected handler factory installation");
                Err(MuxError::HookInstallationFailed(e.to_string()))
            }
        }
    }

    fn settled(&self) -> Option<Result<()>> {
        match self.state() {
            InstallState::Uninstalled => None,
            InstallState::Installed => Some(Ok(())),
            InstallState::Failed => Some(Err(MuxError::HookInstallationFailed(
                "an earlier installation attempt failed; hooks are never installed twice"
                    .to_string(),
            ))),
        }
    }
}
