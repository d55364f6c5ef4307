//! Client library for the clinic patient registry API.
//!
//! [`SessionManager`] owns the signed-in state and talks to the API through
//! the [`AuthGateway`] seam; [`HttpGateway`] is the reqwest implementation
//! that also carries the patient, calendar, and account endpoints.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod patients;
pub mod session;
pub mod storage;
pub mod token;

pub use dashboard::DashboardSummary;
pub use error::{GatewayError, SessionError};
pub use gateway::{AuthGateway, Credentials, HttpGateway};
pub use session::{RestorePhase, Session, SessionManager};
pub use storage::{MemoryStore, SessionStore, StorageError};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserStore;

use shared::config::ClientConfig;
use std::sync::Arc;

/// Gateway and session manager sharing one credential store.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub fn connect(
    config: &ClientConfig,
    store: Arc<dyn SessionStore>,
) -> Result<SessionManager<HttpGateway>, GatewayError> {
    let gateway = HttpGateway::new(config, Arc::clone(&store))?;
    Ok(SessionManager::new(gateway, store))
}
