mod error;
mod global;
mod receivers;
mod router;
mod routes;
mod templates;
mod tenancy;

pub use error::ApiError;
pub use router::{router, AppState};
