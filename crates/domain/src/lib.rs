pub mod entities;
pub mod errors;
pub mod repositories;
pub mod requests;
pub mod services;

pub use entities::*;
pub use errors::{DomainError, DomainResult};
pub use repositories::*;
pub use requests::*;
pub use services::*;
