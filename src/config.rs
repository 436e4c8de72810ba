use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Crate-level constants
pub const APP_NAME: &str = "fieldvisit";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the visit-service base URL.
pub const BASE_URL_ENV: &str = "FIELDVISIT_API_BASE_URL";

/// Fallback base URL for local development.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Request timeout applied to every persistence call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URL of the visit persistence service.
///
/// Read from `FIELDVISIT_API_BASE_URL`; falls back to the local
/// development address. Trailing slashes are handled by the store.
pub fn persistence_base_url() -> String {
    std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

/// Initialize tracing for host applications that have no subscriber of
/// their own. Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_falls_back_to_local() {
        // Only valid when the env var is unset, which is the test default.
        if std::env::var(BASE_URL_ENV).is_err() {
            assert_eq!(persistence_base_url(), DEFAULT_BASE_URL);
        }
    }

    #[test]
    fn log_filter_targets_this_crate() {
        assert!(default_log_filter().starts_with(APP_NAME));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
