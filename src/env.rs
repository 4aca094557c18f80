//! Process environment, read once at startup.
//!
//! - `LS8_TRACE=1`: print a trace line for every cycle, as with `--trace`.
//! - `LS8_FEATURES=<list>`: machine features used when `--features` is not given.

use std::sync::OnceLock;

#[derive(Clone, Debug, Default)]
struct Env {
    trace_enabled: bool,
    features: Option<String>,
}

static ENV: OnceLock<Env> = OnceLock::new();

/// Snapshot the environment. Later calls keep the first snapshot.
pub fn init() {
    ENV.get_or_init(|| Env {
        trace_enabled: std::env::var("LS8_TRACE").is_ok_and(|v| v == "1"),
        features: std::env::var("LS8_FEATURES").ok(),
    });
}

/// Reading before [`init`] behaves as if no variables were set.
fn env() -> &'static Env {
    ENV.get_or_init(Env::default)
}

pub fn is_trace_enabled() -> bool {
    env().trace_enabled
}

pub fn features() -> Option<&'static str> {
    env().features.as_deref()
}
