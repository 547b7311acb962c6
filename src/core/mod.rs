//! Core infrastructure module.
//!
//! This module provides the foundational components shared by the rest of
//! the crate:
//!
//! - [`types`]: Index aliases and the verbosity enumeration
//! - [`constants`]: Codec constants and configuration defaults
//! - [`error`]: The [`ForestError`] taxonomy and the crate-wide [`Result`]
//!
//! It also owns process-wide logging initialization.

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{ForestError, Result};
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static LOGGER_INIT: Once = Once::new();
static CORE_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize logging with the given verbosity.
///
/// `RUST_LOG`, when set, takes precedence over `verbosity`. Repeated calls are
/// no-ops, and a logger installed by the host application is left in place.
pub fn initialize_core(verbosity: VerbosityLevel) -> Result<()> {
    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(verbosity.level_filter());
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        // Another logger may already be installed.
        let _ = builder.try_init();

        CORE_INITIALIZED.store(true, Ordering::Release);
        log::debug!(
            "forest-lower {} initialized (verbosity = {})",
            FOREST_LOWER_VERSION,
            verbosity
        );
    });

    Ok(())
}

/// Check if the core module is initialized
pub fn is_core_initialized() -> bool {
    CORE_INITIALIZED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_initialization() {
        assert!(initialize_core(VerbosityLevel::Warning).is_ok());
        assert!(is_core_initialized());
        // Idempotent
        assert!(initialize_core(VerbosityLevel::Debug).is_ok());
        assert!(is_core_initialized());
    }

    #[test]
    fn test_module_reexports() {
        let _error: ForestError = ForestError::config("test");
        let _node: NodeIndex = 3;
        let _edge: EdgeIndex = 7;
        let _constant = DEFAULT_EQUIVALENCE_TOLERANCE;
    }
}
