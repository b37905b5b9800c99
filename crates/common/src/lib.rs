//! Common types and traits shared across Switchboard crates.
//!
//! This crate provides the data model that the router, classifier and
//! backend adapters exchange: requests, intents, adapter results and the
//! composed response, plus the shared error taxonomy.

pub mod error;
pub mod intent;
pub mod request;
pub mod security;
pub mod traits;

pub use error::{Result, SwitchboardError};
pub use intent::{Backend, Intent};
pub use request::{
    AdapterResult, Request, ResponseSection, RoutedResponse, MAX_REQUEST_LENGTH,
    NOT_FOUND_SENTINEL,
};
pub use security::redact_secrets;
pub use traits::Adapter;
