pub mod error;
pub mod fs;
pub mod locks;
pub mod reload;
pub mod tenancy;

pub use error::Error;
pub use fs::{DiskClient, FsClient};
pub use locks::FileLocker;
pub use reload::Reloader;
pub use tenancy::TenancyConfig;
