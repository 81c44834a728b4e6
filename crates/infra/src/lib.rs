//! Infrastructure layer: storage backends, configuration and startup seeding.

pub mod config;
pub mod seed;
pub mod store;

pub use config::{AdminSeed, AppConfig, ConfigError, DatabaseConfig};
pub use seed::seed_admin;
pub use store::{
    CommentRepository, InMemoryStore, Store, StoreError, StoreResult, TaskRepository,
    UserRepository,
};
#[cfg(feature = "postgres")]
pub use store::PgStore;
