pub mod error;
pub mod rest;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, CacheTtls};
