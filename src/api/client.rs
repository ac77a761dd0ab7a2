use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use crate::api::models::{
    AlertResponse, AuthResponse, EmergencyAlert, EmergencyContact, LoginRequest,
};
use crate::error::ApiError;
use crate::session::{Session, SessionStore};

/// The backend surface consumed by the alert flow and the contact book.
/// Implemented over HTTP by [`ApiClient`]; tests substitute mocks.
#[async_trait]
pub trait EmergencyApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn send_alert(&self, alert: &EmergencyAlert) -> Result<AlertResponse, ApiError>;
    async fn list_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>, ApiError>;
    async fn create_contact(&self, contact: &EmergencyContact)
        -> Result<EmergencyContact, ApiError>;
    async fn update_contact(
        &self,
        id: &str,
        contact: &EmergencyContact,
    ) -> Result<EmergencyContact, ApiError>;
    async fn delete_contact(&self, id: &str) -> Result<(), ApiError>;
}

pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::with_http(HttpClient::new(), base_url, session)
    }

    /// Use a caller-built `reqwest::Client`, e.g. one with a timeout.
    pub fn with_http(
        http: HttpClient,
        base_url: &str,
        session: Arc<SessionStore>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Attach the bearer token when the store holds one. A missing token is
    /// not an error here; the server decides whether the route needs auth.
    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Login and, on success, write the session so later calls carry the token.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let auth = self.login(email, password).await?;
        self.session.store(Session {
            access_token: auth.access_token.clone(),
            user_id: auth.user.id.clone(),
        });
        log::debug!("signed in as user {}", auth.user.id);
        Ok(auth)
    }

    /// Drop the stored session.
    pub fn sign_out(&self) {
        self.session.clear();
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}

/// Uniform response rule: 2xx with a parseable body is `Ok`; 2xx with an
/// empty or garbage body is `EmptyResponse`; non-2xx carries the status and
/// whatever text the server sent.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
        return Err(ApiError::EmptyResponse);
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        log::warn!("unparseable response body: {}", e);
        ApiError::EmptyResponse
    })
}

async fn expect_success(resp: reqwest::Response) -> Result<(), ApiError> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        let message = resp.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl EmergencyApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .http
            .post(self.endpoint("auth/login"))
            .json(&body)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn send_alert(&self, alert: &EmergencyAlert) -> Result<AlertResponse, ApiError> {
        let req = self.http.post(self.endpoint("alerts/emergency")).json(alert);
        let resp = self.with_auth(req).send().await?;
        read_json(resp).await
    }

    async fn list_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>, ApiError> {
        let req = self
            .http
            .get(self.endpoint(&format!("emergency-contacts/user/{}", user_id)));
        let resp = self.with_auth(req).send().await?;
        read_json(resp).await
    }

    async fn create_contact(
        &self,
        contact: &EmergencyContact,
    ) -> Result<EmergencyContact, ApiError> {
        let req = self
            .http
            .post(self.endpoint("emergency-contacts"))
            .json(contact);
        let resp = self.with_auth(req).send().await?;
        read_json(resp).await
    }

    async fn update_contact(
        &self,
        id: &str,
        contact: &EmergencyContact,
    ) -> Result<EmergencyContact, ApiError> {
        let req = self
            .http
            .patch(self.endpoint(&format!("emergency-contacts/{}", id)))
            .json(contact);
        let resp = self.with_auth(req).send().await?;
        read_json(resp).await
    }

    async fn delete_contact(&self, id: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .delete(self.endpoint(&format!("emergency-contacts/{}", id)));
        let resp = self.with_auth(req).send().await?;
        expect_success(resp).await
    }
}
