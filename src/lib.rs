//! Blog post CRUD API over a document store.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod repository;

pub use config::schema::ApiConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use model::{Message, Post};
pub use repository::{PostRepository, RepositoryError};
