//! Emergency-alert backend client.
//!
//! The pieces of a wrist-worn SOS app worth keeping when the UI is stripped
//! away: resolving a best-effort device position, submitting an alert to the
//! backend, keeping a contact list in sync with the server, and an optional
//! periodic location beacon. UI toolkits and OS permission prompts stay on
//! the embedder's side of the [`location::LocationProvider`] and
//! [`beacon::BeaconPublisher`] seams.

pub mod alert;
pub mod api;
pub mod beacon;
pub mod config;
pub mod contacts;
pub mod error;
pub mod location;
pub mod session;

pub use alert::{parse_coordinates, AlertFlow, AlertFlowState};
pub use api::client::{ApiClient, EmergencyApi};
pub use api::models::{
    AlertResponse, AuthResponse, EmergencyAlert, EmergencyContact, LoginRequest, User,
};
pub use beacon::{BeaconConfig, BeaconPublisher, LocationBeacon};
pub use config::Config;
pub use contacts::ContactBook;
pub use error::{AlertError, ApiError};
pub use location::{Location, LocationProvider, LocationResolver};
pub use session::{Session, SessionStore};
