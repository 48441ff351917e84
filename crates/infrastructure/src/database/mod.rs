pub mod in_memory_user_repository;
pub mod manager;
pub mod postgres;

pub use in_memory_user_repository::InMemoryUserRepository;
pub use manager::build_user_repository;
pub use postgres::{DatabaseManager, PostgresUserRepository};
