use crate::api::client::EmergencyApi;
use crate::api::models::{AlertResponse, EmergencyAlert, EmergencyContact};
use crate::error::AlertError;
use crate::location::{Location, LocationProvider, LocationResolver};

/// Where an SOS attempt currently stands. Terminal states carry what the UI
/// needs to render; `reset` returns to `Idle` for the next attempt.
#[derive(Debug)]
pub enum AlertFlowState {
    Idle,
    Confirming,
    Sending,
    Succeeded(AlertResponse),
    Failed(AlertError),
}

/// Drives one emergency alert from button press to backend response.
///
/// The flow never retries on its own; every retry is a fresh user action
/// starting again from `Idle`.
pub struct AlertFlow<P, A> {
    resolver: LocationResolver<P>,
    api: A,
    state: AlertFlowState,
}

impl<P: LocationProvider, A: EmergencyApi> AlertFlow<P, A> {
    pub fn new(resolver: LocationResolver<P>, api: A) -> Self {
        Self {
            resolver,
            api,
            state: AlertFlowState::Idle,
        }
    }

    pub fn state(&self) -> &AlertFlowState {
        &self.state
    }

    /// SOS button pressed. Moves to `Confirming` when location permission is
    /// already granted; otherwise stays `Idle` and reports `PermissionDenied`
    /// so the caller can run the platform permission prompt.
    pub fn press_sos(&mut self) -> Result<(), AlertError> {
        if !matches!(self.state, AlertFlowState::Idle) {
            return Ok(());
        }
        if !self.resolver.has_permission() {
            return Err(AlertError::PermissionDenied);
        }
        self.state = AlertFlowState::Confirming;
        Ok(())
    }

    /// User confirmed the send.
    ///
    /// `display_hint` is the coordinate string the confirmation screen was
    /// already showing; when it parses as a "lat, lng" pair it is reused
    /// verbatim and the device is not queried again. Without a usable hint
    /// the resolver runs once. A missing location aborts before any network
    /// call — alerts are never sent without coordinates.
    pub async fn confirm(
        &mut self,
        display_hint: Option<&str>,
        contacts: Vec<EmergencyContact>,
    ) -> &AlertFlowState {
        if !matches!(self.state, AlertFlowState::Confirming) {
            return &self.state;
        }
        self.state = AlertFlowState::Sending;

        let location = match display_hint.and_then(parse_coordinates) {
            Some(loc) => Some(loc),
            None => self.resolver.resolve().await,
        };
        let Some(location) = location else {
            log::warn!("alert abandoned: no location available");
            self.state = AlertFlowState::Failed(AlertError::LocationUnavailable);
            return &self.state;
        };

        let contacts = if contacts.is_empty() {
            None
        } else {
            Some(contacts)
        };
        let alert = EmergencyAlert::new(location.latitude, location.longitude, contacts);
        match self.api.send_alert(&alert).await {
            Ok(resp) => {
                log::info!(
                    "alert {} delivered, {} contacts notified",
                    resp.alert_id.as_deref().unwrap_or("<no id>"),
                    resp.contacts_notified
                );
                self.state = AlertFlowState::Succeeded(resp);
            }
            Err(e) => {
                log::error!("alert submission failed: {}", e);
                self.state = AlertFlowState::Failed(e.into());
            }
        }
        &self.state
    }

    /// Back to `Idle` for the next attempt. Also recovers a flow whose
    /// `confirm` future was dropped mid-send; while one is actually in
    /// flight it holds the exclusive borrow, so this cannot race it.
    pub fn reset(&mut self) {
        self.state = AlertFlowState::Idle;
    }
}

/// Parse a displayed "lat, lng" string back into a position. Both halves
/// must be finite floats.
pub fn parse_coordinates(s: &str) -> Option<Location> {
    let (lat, lng) = s.split_once(',')?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let longitude: f64 = lng.trim().parse().ok()?;
    if latitude.is_finite() && longitude.is_finite() {
        Some(Location {
            latitude,
            longitude,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{AuthResponse, EmergencyContact};
    use crate::error::ApiError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const HOME: Location = Location {
        latitude: 17.45,
        longitude: -92.45,
    };

    struct FakeProvider {
        permission: bool,
        position: Option<Location>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LocationProvider for FakeProvider {
        fn has_permission(&self) -> bool {
            self.permission
        }

        async fn last_known(&self) -> Result<Option<Location>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.position)
        }

        async fn current_fix(&self) -> Result<Location, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.position.ok_or_else(|| "no signal".to_string())
        }
    }

    fn provider(position: Option<Location>) -> (FakeProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            FakeProvider {
                permission: true,
                position,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[derive(Default)]
    struct FakeApi {
        sent: Mutex<Vec<EmergencyAlert>>,
        response: Mutex<Option<Result<AlertResponse, ApiError>>>,
    }

    impl FakeApi {
        fn replying(resp: AlertResponse) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                response: Mutex::new(Some(Ok(resp))),
            }
        }

        fn send_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EmergencyApi for &FakeApi {
        async fn login(&self, _: &str, _: &str) -> Result<AuthResponse, ApiError> {
            unimplemented!("not exercised")
        }

        async fn send_alert(&self, alert: &EmergencyAlert) -> Result<AlertResponse, ApiError> {
            self.sent.lock().unwrap().push(alert.clone());
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ApiError::EmptyResponse))
        }

        async fn list_contacts(&self, _: &str) -> Result<Vec<EmergencyContact>, ApiError> {
            unimplemented!("not exercised")
        }

        async fn create_contact(
            &self,
            _: &EmergencyContact,
        ) -> Result<EmergencyContact, ApiError> {
            unimplemented!("not exercised")
        }

        async fn update_contact(
            &self,
            _: &str,
            _: &EmergencyContact,
        ) -> Result<EmergencyContact, ApiError> {
            unimplemented!("not exercised")
        }

        async fn delete_contact(&self, _: &str) -> Result<(), ApiError> {
            unimplemented!("not exercised")
        }
    }

    fn ok_response() -> AlertResponse {
        AlertResponse {
            success: true,
            message: "sent".into(),
            alert_id: Some("X".into()),
            contacts_notified: 1,
        }
    }

    fn contact_a() -> EmergencyContact {
        EmergencyContact::draft("Ana", "+52 555 000 1111", None)
    }

    #[tokio::test]
    async fn valid_hint_skips_the_resolver() {
        let (prov, calls) = provider(None);
        let api = FakeApi::replying(ok_response());
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        flow.press_sos().unwrap();
        flow.confirm(Some("17.45, -92.45"), vec![]).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let sent = api.sent.lock().unwrap();
        assert_eq!(sent[0].latitude, 17.45);
        assert_eq!(sent[0].longitude, -92.45);
    }

    #[tokio::test]
    async fn malformed_hint_falls_back_to_one_resolve() {
        let (prov, calls) = provider(Some(HOME));
        let api = FakeApi::replying(ok_response());
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        flow.press_sos().unwrap();
        flow.confirm(Some("somewhere nice"), vec![]).await;

        // one last_known hit, no fresh fix
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(flow.state(), AlertFlowState::Succeeded(_)));
    }

    #[tokio::test]
    async fn missing_location_fails_preflight_without_sending() {
        let (prov, _) = provider(None);
        let api = FakeApi::default();
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        flow.press_sos().unwrap();
        flow.confirm(None, vec![contact_a()]).await;

        assert!(matches!(
            flow.state(),
            AlertFlowState::Failed(AlertError::LocationUnavailable)
        ));
        assert_eq!(api.send_count(), 0);
    }

    #[tokio::test]
    async fn success_path_carries_the_response() {
        let (prov, _) = provider(Some(HOME));
        let api = FakeApi::replying(ok_response());
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        flow.press_sos().unwrap();
        flow.confirm(None, vec![contact_a()]).await;

        match flow.state() {
            AlertFlowState::Succeeded(resp) => {
                assert!(resp.success);
                assert_eq!(resp.alert_id.as_deref(), Some("X"));
                assert_eq!(resp.contacts_notified, 1);
            }
            other => panic!("expected Succeeded, got {:?}", other),
        }
        let sent = api.sent.lock().unwrap();
        assert_eq!(sent[0].latitude, HOME.latitude);
        assert_eq!(sent[0].contacts.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn backend_error_surfaces_as_failed() {
        let (prov, _) = provider(Some(HOME));
        let api = FakeApi {
            sent: Mutex::new(Vec::new()),
            response: Mutex::new(Some(Err(ApiError::Http {
                status: 500,
                message: "boom".into(),
            }))),
        };
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        flow.press_sos().unwrap();
        flow.confirm(None, vec![]).await;

        assert!(matches!(
            flow.state(),
            AlertFlowState::Failed(AlertError::Api(_))
        ));
    }

    #[tokio::test]
    async fn press_without_permission_stays_idle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let prov = FakeProvider {
            permission: false,
            position: None,
            calls,
        };
        let api = FakeApi::default();
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        assert!(matches!(
            flow.press_sos(),
            Err(AlertError::PermissionDenied)
        ));
        assert!(matches!(flow.state(), AlertFlowState::Idle));
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let (prov, _) = provider(Some(HOME));
        let api = FakeApi::replying(ok_response());
        let mut flow = AlertFlow::new(LocationResolver::new(prov), &api);

        flow.press_sos().unwrap();
        flow.confirm(None, vec![]).await;
        assert!(matches!(flow.state(), AlertFlowState::Succeeded(_)));

        flow.reset();
        assert!(matches!(flow.state(), AlertFlowState::Idle));
    }

    #[test]
    fn coordinate_parsing() {
        assert_eq!(parse_coordinates("17.45, -92.45"), Some(HOME));
        assert_eq!(
            parse_coordinates("0,0"),
            Some(Location {
                latitude: 0.0,
                longitude: 0.0
            })
        );
        assert_eq!(parse_coordinates(""), None);
        assert_eq!(parse_coordinates("17.45"), None);
        assert_eq!(parse_coordinates("north, south"), None);
        assert_eq!(parse_coordinates("1, 2, 3"), None);
        assert_eq!(parse_coordinates("NaN, 4.0"), None);
    }
}
