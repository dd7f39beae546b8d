mod alerts;
mod health;
mod metrics;
mod rules;
mod server;

pub use rules::ErrorResponse;
pub use server::{router, serve, AppState};
