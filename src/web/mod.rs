//! Web server module
//!
//! Exposes the search orchestrator over a JSON HTTP API.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::status_for;
pub use handlers::client_key;
pub use routes::create_router;
pub use state::AppState;
