use std::path::PathBuf;

/// In-memory bytes a sink may hold before it moves to disk.
pub const DEFAULT_SPILL_THRESHOLD: usize = 1 << 20;

/// Overrides [`SpillConfig::memory_threshold`] when set to a valid byte count.
pub const SPILL_THRESHOLD_ENV: &str = "FEDQ_SPILL_THRESHOLD_BYTES";

/// Overrides [`SpillConfig::temp_dir`] when set to a non-empty path.
pub const SPILL_DIR_ENV: &str = "FEDQ_SPILL_DIR";

/// Thin configuration for spill-capable sinks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpillConfig {
    /// Bytes kept in memory before a sink spills to a temp file.
    pub memory_threshold: usize,
    /// Directory for spill files; `None` uses the system temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            memory_threshold: DEFAULT_SPILL_THRESHOLD,
            temp_dir: None,
        }
    }
}

impl SpillConfig {
    /// Defaults overridden by `FEDQ_SPILL_THRESHOLD_BYTES` and `FEDQ_SPILL_DIR`.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SpillConfig::from_env`] but reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(SPILL_THRESHOLD_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(parsed) => config.memory_threshold = parsed,
                Err(_) => tracing::warn!(
                    "ignoring {}={:?}: not a byte count",
                    SPILL_THRESHOLD_ENV,
                    raw
                ),
            }
        }
        if let Some(dir) = lookup(SPILL_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.temp_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    pub fn with_memory_threshold(mut self, bytes: usize) -> Self {
        self.memory_threshold = bytes;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }
}
