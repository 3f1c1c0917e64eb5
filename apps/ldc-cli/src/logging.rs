//! Tracing initialization. No OpenTelemetry — this binary runs one
//! document at a time on someone's terminal, not a fleet behind a
//! collector — scaled down from the server's `init_logging` to its
//! `init_simple_logging` fallback: `RUST_LOG` or a sane default, plain
//! or JSON depending on `--json`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ldc_cli=info,ldc_eval=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry.with(fmt::layer().json().with_current_span(true)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
