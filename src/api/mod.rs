mod handlers;
mod routes;
mod state;

pub use handlers::MAX_K;
pub use routes::create_router;
pub use state::AppState;
