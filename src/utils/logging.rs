/// Map a textual level (`"warn"`, `"debug"`, ...) onto a `tracing::Level`.
///
/// Unknown values fall back to `INFO`.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}

/// Initialize tracing for the process.
///
/// Uses `try_init`, so tests and embedding applications can call this more
/// than once without panicking; only the first call installs a subscriber.
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .try_init();
}
