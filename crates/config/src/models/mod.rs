pub mod app_config;
pub mod database;
pub mod logging;
pub mod observability;
pub mod server;

pub use app_config::*;
pub use database::*;
pub use logging::*;
pub use observability::*;
pub use server::*;
