pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::router;
pub use state::{AppState, SharedState};
