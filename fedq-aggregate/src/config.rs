use fedq_storage::SpillConfig;

/// Fractional digits kept by AVG over arbitrary-precision inputs unless the
/// running sum already carries more.
pub const DEFAULT_AVG_DECIMAL_SCALE: i64 = 16;

/// Overrides [`AggregateConfig::avg_decimal_scale`].
pub const AVG_DECIMAL_SCALE_ENV: &str = "FEDQ_AVG_DECIMAL_SCALE";

/// Settings shared by every accumulator evaluated under one context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateConfig {
    pub avg_decimal_scale: i64,
    pub spill: SpillConfig,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            avg_decimal_scale: DEFAULT_AVG_DECIMAL_SCALE,
            spill: SpillConfig::default(),
        }
    }
}

impl AggregateConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            spill: SpillConfig::from_lookup(&lookup),
            ..Self::default()
        };
        if let Some(raw) = lookup(AVG_DECIMAL_SCALE_ENV) {
            match raw.trim().parse::<i64>() {
                Ok(scale) if scale >= 0 => config.avg_decimal_scale = scale,
                _ => tracing::warn!(
                    "ignoring {}={:?}: not a non-negative scale",
                    AVG_DECIMAL_SCALE_ENV,
                    raw
                ),
            }
        }
        config
    }

    pub fn with_spill(mut self, spill: SpillConfig) -> Self {
        self.spill = spill;
        self
    }

    pub fn with_avg_decimal_scale(mut self, scale: i64) -> Self {
        self.avg_decimal_scale = scale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedq_storage::SPILL_THRESHOLD_ENV;

    #[test]
    fn lookup_reads_scale_and_spill_settings() {
        let config = AggregateConfig::from_lookup(|key| match key {
            AVG_DECIMAL_SCALE_ENV => Some("4".into()),
            SPILL_THRESHOLD_ENV => Some("128".into()),
            _ => None,
        });
        assert_eq!(config.avg_decimal_scale, 4);
        assert_eq!(config.spill.memory_threshold, 128);
    }

    #[test]
    fn negative_scale_is_ignored() {
        let config = AggregateConfig::from_lookup(|key| match key {
            AVG_DECIMAL_SCALE_ENV => Some("-1".into()),
            _ => None,
        });
        assert_eq!(config.avg_decimal_scale, DEFAULT_AVG_DECIMAL_SCALE);
    }
}
