//! Process-wide registry instance.
//!
//! The host initializes it once at startup and tears it down explicitly;
//! nothing is created on first use.

use crate::config::RegistryConfig;
use crate::registry::ObserverRegistry;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Observer registry already initialized")]
    AlreadyInitialized,

    #[error("Observer registry not initialized")]
    NotInitialized,
}

lazy_static! {
    static ref GLOBAL_REGISTRY: RwLock<Option<Arc<ObserverRegistry>>> = RwLock::new(None);
}

/// Create the process-wide registry.
pub fn init(config: RegistryConfig) -> Result<Arc<ObserverRegistry>, RegistryError> {
    let mut slot = GLOBAL_REGISTRY.write();
    if slot.is_some() {
        return Err(RegistryError::AlreadyInitialized);
    }
    let registry = Arc::new(ObserverRegistry::new(config));
    *slot = Some(registry.clone());
    info!("Observer registry initialized");
    Ok(registry)
}

/// The process-wide registry.
pub fn global() -> Result<Arc<ObserverRegistry>, RegistryError> {
    GLOBAL_REGISTRY
        .read()
        .clone()
        .ok_or(RegistryError::NotInitialized)
}

/// Drop every registration but keep the registry. Used for test teardown.
pub fn clear() {
    if let Some(registry) = GLOBAL_REGISTRY.read().as_ref() {
        registry.clear();
    }
}

/// Tear the registry down. Returns whether one was installed.
pub fn shutdown() -> bool {
    GLOBAL_REGISTRY.write().take().is_some()
}
