//! Shared helpers for fedq test binaries.

use std::sync::Once;

use fedq_storage::SpillConfig;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let filter = match std::env::var("RUST_LOG") {
            Ok(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            Err(_) => EnvFilter::new("info"),
        };
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .init();
    });
}

/// Spill settings writing into a fresh private directory.
///
/// Keep the returned [`TempDir`] alive for as long as spilled handles are
/// read; dropping it removes the directory.
pub fn isolated_spill_config(memory_threshold: usize) -> std::io::Result<(SpillConfig, TempDir)> {
    let dir = tempfile::Builder::new().prefix("fedq-test-").tempdir()?;
    let config = SpillConfig::default()
        .with_memory_threshold(memory_threshold)
        .with_temp_dir(dir.path());
    Ok((config, dir))
}

/// Number of entries currently in `dir`.
pub fn count_entries(dir: &TempDir) -> std::io::Result<usize> {
    Ok(std::fs::read_dir(dir.path())?.count())
}

#[cfg(feature = "auto-init")]
mod auto {
    // Runs at test binary load so individual tests need not call init.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_config_points_at_empty_dir() {
        let (config, dir) = isolated_spill_config(8).unwrap();
        assert_eq!(config.memory_threshold, 8);
        assert_eq!(config.temp_dir.as_deref(), Some(dir.path()));
        assert_eq!(count_entries(&dir).unwrap(), 0);
    }

    #[test]
    fn init_is_idempotent() {
        init_tracing_for_tests();
        init_tracing_for_tests();
    }
}
