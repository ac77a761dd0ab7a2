use async_trait::async_trait;

/// A resolved device position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Platform seam over the device positioning stack. Implementations wrap
/// whatever the target OS offers (fused provider, GPSd, a fake in tests).
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether the app currently holds location permission.
    fn has_permission(&self) -> bool;

    /// The platform's cached last-known position, if any.
    async fn last_known(&self) -> Result<Option<Location>, String>;

    /// Request a single fresh high-accuracy fix. No timeout is imposed here;
    /// callers wanting bounded latency wrap the resolve call themselves.
    async fn current_fix(&self) -> Result<Location, String>;
}

/// Best-effort position resolver. Tries the cheap cached position first,
/// falls back to a fresh fix (with one retry), and maps every failure to
/// `None` — callers must handle the missing case.
pub struct LocationResolver<P> {
    provider: P,
}

impl<P: LocationProvider> LocationResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn has_permission(&self) -> bool {
        self.provider.has_permission()
    }

    pub async fn resolve(&self) -> Option<Location> {
        if !self.provider.has_permission() {
            log::debug!("location permission absent, skipping platform calls");
            return None;
        }

        match self.provider.last_known().await {
            Ok(Some(loc)) => return Some(loc),
            Ok(None) => {}
            Err(e) => log::debug!("last-known location failed: {}", e),
        }

        match self.provider.current_fix().await {
            Ok(loc) => Some(loc),
            Err(first) => {
                log::debug!("fresh fix failed ({}), retrying once", first);
                match self.provider.current_fix().await {
                    Ok(loc) => Some(loc),
                    Err(second) => {
                        log::warn!("location unavailable: {}", second);
                        None
                    }
                }
            }
        }
    }
}
