//! API layer - HTTP endpoints and middleware

pub mod admin;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::RequireAdmin;
pub use router::{create_router, create_router_with_metrics};
pub use state::AppState;
