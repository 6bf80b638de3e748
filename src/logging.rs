//! Structured logging on stderr. `RUST_LOG` filters (default `info`);
//! `AMDTEL_LOG_JSON=1` switches from pretty to JSON lines.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_JSON: &str = "AMDTEL_LOG_JSON";

fn json_requested() -> bool {
    std::env::var(ENV_LOG_JSON)
        .map(|value| matches!(value.trim(), "1" | "true"))
        .unwrap_or(false)
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_requested() {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_logging();
        init_logging();
        tracing::info!("logging initialized");
    }
}
