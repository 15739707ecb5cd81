pub mod config;
pub mod cors;
pub mod error;
pub mod routes;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use routes::{build_router, AppState};
