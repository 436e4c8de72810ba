//! Device geolocation acquisition with a bounded wait.
//!
//! The host shell (browser geolocation bridge, OS location service) sits
//! behind [`LocationProvider`]; this module adds the high-accuracy request
//! policy, the timeout clamp, and the typed error surface. A location
//! failure is always recoverable by the caller — the pending transition is
//! aborted and may be retried, never escalated.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Coordinates;

/// Shortest wait a caller may configure.
pub const MIN_WAIT: Duration = Duration::from_secs(10);
/// Longest wait a caller may configure.
pub const MAX_WAIT: Duration = Duration::from_secs(30);
/// Wait used when the caller expresses no preference.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("This device has no usable location capability")]
    Unsupported,

    #[error("Location permission was denied")]
    PermissionDenied,

    #[error("Device position is currently unavailable")]
    PositionUnavailable,

    #[error("Location request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Location request failed: {0}")]
    Unknown(String),
}

/// Raw device position source.
///
/// Implemented by the host shell and by scripted test doubles. The provider
/// reports its own failure modes; the bounded wait lives in
/// [`GeolocationService`].
#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Wraps a [`LocationProvider`] into a single awaitable, time-bounded read.
///
/// Dropping the returned future abandons the request; cleanup of the
/// underlying device read is best-effort, whatever the platform provides.
pub struct GeolocationService<P> {
    provider: P,
    wait: Duration,
}

impl<P: LocationProvider> GeolocationService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            wait: DEFAULT_WAIT,
        }
    }

    /// Caller-chosen wait, clamped into the supported 10–30 s window.
    pub fn with_wait(provider: P, wait: Duration) -> Self {
        Self {
            provider,
            wait: wait.clamp(MIN_WAIT, MAX_WAIT),
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// One high-accuracy position read, bounded by the configured wait.
    pub async fn acquire(&self) -> Result<Coordinates, LocationError> {
        debug!(wait_secs = self.wait.as_secs(), "acquiring device location");
        match tokio::time::timeout(self.wait, self.provider.locate()).await {
            Ok(Ok(coordinates)) => {
                debug!(lat = coordinates.lat, lng = coordinates.lng, "location acquired");
                Ok(coordinates)
            }
            Ok(Err(err)) => {
                warn!(%err, "location provider failed");
                Err(err)
            }
            Err(_) => {
                warn!(wait_secs = self.wait.as_secs(), "location request timed out");
                Err(LocationError::Timeout(self.wait))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that resolves with a fixed outcome.
    struct Scripted(Result<Coordinates, LocationError>);

    impl LocationProvider for Scripted {
        async fn locate(&self) -> Result<Coordinates, LocationError> {
            self.0.clone()
        }
    }

    /// Provider that never resolves.
    struct Stalled;

    impl LocationProvider for Stalled {
        async fn locate(&self) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn acquire_passes_through_a_fix() {
        let service = GeolocationService::new(Scripted(Ok(Coordinates {
            lat: -25.43,
            lng: -49.27,
        })));
        let fix = service.acquire().await.unwrap();
        assert_eq!(fix.lat, -25.43);
        assert_eq!(fix.lng, -49.27);
    }

    #[tokio::test]
    async fn acquire_surfaces_provider_errors() {
        let service = GeolocationService::new(Scripted(Err(LocationError::PermissionDenied)));
        assert_eq!(
            service.acquire().await.unwrap_err(),
            LocationError::PermissionDenied
        );
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_times_out_a_stalled_provider() {
        let service = GeolocationService::with_wait(Stalled, Duration::from_secs(10));
        let err = service.acquire().await.unwrap_err();
        assert_eq!(err, LocationError::Timeout(Duration::from_secs(10)));
    }

    #[test]
    fn wait_is_clamped_to_the_supported_window() {
        let short = GeolocationService::with_wait(Stalled, Duration::from_secs(1));
        assert_eq!(short.wait(), MIN_WAIT);
        let long = GeolocationService::with_wait(Stalled, Duration::from_secs(300));
        assert_eq!(long.wait(), MAX_WAIT);
    }
}
