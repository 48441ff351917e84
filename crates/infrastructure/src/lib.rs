pub mod database;
pub mod password;

pub use database::*;
pub use password::BcryptPasswordHasher;
