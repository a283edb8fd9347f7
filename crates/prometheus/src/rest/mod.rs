mod alerts;
mod error;
mod router;
mod tenancy;

pub use error::ApiError;
pub use router::{router, AppState};
