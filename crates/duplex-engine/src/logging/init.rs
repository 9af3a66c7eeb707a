use std::sync::Once;

use log::LevelFilter;

/// Logger configuration.
///
/// Filter precedence: `env_filter`, then `RUST_LOG`, then `default_level`.
/// `env_filter` uses `env_logger` syntax, e.g. `"duplex_engine=trace,wgpu=warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Millisecond timestamps; per-frame trace output is hard to read without them.
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Default configuration at `level`.
    pub fn with_level(level: LevelFilter) -> Self {
        Self { default_level: level, ..Self::default() }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger.
///
/// Idempotent. A logger installed elsewhere first (e.g. by a test harness) is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.default_level);
            }
        }

        builder.write_style(config.write_style);
        if config.timestamps {
            builder.format_timestamp_millis();
        } else {
            builder.format_timestamp(None);
        }

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_logging(LoggingConfig::with_level(LevelFilter::Warn));
        init_logging(LoggingConfig::default());
        log::warn!("still alive");
    }

    #[test]
    fn with_level_keeps_other_defaults() {
        let cfg = LoggingConfig::with_level(LevelFilter::Trace);
        assert_eq!(cfg.default_level, LevelFilter::Trace);
        assert!(cfg.env_filter.is_none());
        assert!(cfg.timestamps);
    }
}
