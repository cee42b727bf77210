use tracing_subscriber::{
    filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Tracing telemetry style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FmtStyle {
    /// Compact style.
    Compact,
    /// Pretty Style.
    Pretty,
    /// JSON Style.
    Json,
}

/// The filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Get the `RUST_LOG` filter, or the default one.
pub fn rust_log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Tracing telemetry builder. Traces are written to stdout.
pub struct TracingTelemetry {
    style: FmtStyle,
    colours: bool,
}

impl TracingTelemetry {
    /// Tracing telemetry default builder.
    pub fn builder() -> Self {
        Self {
            style: FmtStyle::Pretty,
            colours: true,
        }
    }
    /// Specify style.
    pub fn with_style(self, style: FmtStyle) -> TracingTelemetry {
        TracingTelemetry { style, ..self }
    }
    /// Specify whether colour is needed or not.
    pub fn with_colours(self, colours: bool) -> TracingTelemetry {
        TracingTelemetry { colours, ..self }
    }

    /// Initialize the telemetry instance.
    pub fn init(self, service_name: &str) {
        let stdout = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(self.colours);

        let subscriber = Registry::default().with(rust_log_filter());

        match self.style {
            FmtStyle::Compact => subscriber.with(stdout.compact()).init(),
            FmtStyle::Pretty => subscriber.with(stdout.pretty()).init(),
            FmtStyle::Json => subscriber.with(stdout.json()).init(),
        };
        tracing::debug!(service = service_name, "tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn styles() {
        assert_eq!(FmtStyle::from_str("json"), Ok(FmtStyle::Json));
        assert_eq!(FmtStyle::Compact.as_ref(), "compact");
        assert!(FmtStyle::from_str("fancy").is_err());
    }
}
