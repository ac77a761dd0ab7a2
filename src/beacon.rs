use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::models::now_millis;
use crate::config::Config;
use crate::location::{LocationProvider, LocationResolver};

/// Seam over the external pub/sub client (MQTT or similar). This crate only
/// drives it; no broker implementation ships here.
#[async_trait]
pub trait BeaconPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), String>;
    async fn disconnect(&self);
}

#[derive(Debug, Clone)]
pub struct BeaconConfig {
    pub topic: String,
    pub interval: Duration,
}

impl BeaconConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            topic: config.beacon_topic.clone(),
            interval: Duration::from_secs(config.beacon_interval_secs),
        }
    }
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            topic: "alert/location".to_string(),
            interval: Duration::from_secs(10),
        }
    }
}

/// Long-lived periodic task publishing the current position to a topic while
/// active. Runs independently of user-initiated flows; `stop` tears down the
/// publisher connection before the task exits.
pub struct LocationBeacon {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl LocationBeacon {
    pub fn start<P, B>(resolver: LocationResolver<P>, publisher: B, config: BeaconConfig) -> Self
    where
        P: LocationProvider + 'static,
        B: BeaconPublisher + 'static,
    {
        let (shutdown, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        beacon_tick(&resolver, &publisher, &config.topic).await;
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            publisher.disconnect().await;
            log::debug!("location beacon stopped");
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signal shutdown and wait for the task to disconnect and exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl Drop for LocationBeacon {
    fn drop(&mut self) {
        // Not a clean teardown; `stop` is the supported path.
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn beacon_tick<P: LocationProvider>(
    resolver: &LocationResolver<P>,
    publisher: &impl BeaconPublisher,
    topic: &str,
) {
    let Some(loc) = resolver.resolve().await else {
        log::warn!("beacon tick skipped: location unavailable");
        return;
    };
    let payload = serde_json::json!({
        "latitude": loc.latitude,
        "longitude": loc.longitude,
        "timestamp": now_millis(),
    })
    .to_string();
    if let Err(e) = publisher.publish(topic, &payload).await {
        log::warn!("beacon publish failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct StillProvider(Option<Location>);

    #[async_trait]
    impl LocationProvider for StillProvider {
        fn has_permission(&self) -> bool {
            true
        }

        async fn last_known(&self) -> Result<Option<Location>, String> {
            Ok(self.0)
        }

        async fn current_fix(&self) -> Result<Location, String> {
            self.0.ok_or_else(|| "no fix".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String)>>,
        publishes: AtomicUsize,
        disconnected: AtomicBool,
    }

    #[async_trait]
    impl BeaconPublisher for Arc<RecordingPublisher> {
        async fn publish(&self, topic: &str, payload: &str) -> Result<(), String> {
            self.publishes.fetch_add(1, Ordering::SeqCst);
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_string()));
            Ok(())
        }

        async fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_position_and_disconnects_on_stop() {
        let publisher = Arc::new(RecordingPublisher::default());
        let resolver = LocationResolver::new(StillProvider(Some(Location {
            latitude: 17.45,
            longitude: -92.45,
        })));
        let beacon = LocationBeacon::start(
            resolver,
            publisher.clone(),
            BeaconConfig::default(),
        );

        // first interval tick fires immediately
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(beacon.is_running());
        beacon.stop().await;

        assert!(publisher.publishes.load(Ordering::SeqCst) >= 1);
        assert!(publisher.disconnected.load(Ordering::SeqCst));

        let published = publisher.published.lock().unwrap();
        let (topic, payload) = &published[0];
        assert_eq!(topic, "alert/location");
        let json: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(json["latitude"], 17.45);
        assert_eq!(json["longitude"], -92.45);
        assert!(json["timestamp"].is_i64());
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_location_skips_the_publish() {
        let publisher = Arc::new(RecordingPublisher::default());
        let resolver = LocationResolver::new(StillProvider(None));
        let beacon =
            LocationBeacon::start(resolver, publisher.clone(), BeaconConfig::default());

        tokio::time::sleep(Duration::from_millis(1)).await;
        beacon.stop().await;

        assert_eq!(publisher.publishes.load(Ordering::SeqCst), 0);
        assert!(publisher.disconnected.load(Ordering::SeqCst));
    }
}
