mod handlers;
mod routes;
mod state;

pub use routes::{build_cors_layer, create_router};
pub use state::AppState;
