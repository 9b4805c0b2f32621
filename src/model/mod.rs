//! Domain types shared by the repository and the HTTP layer.

pub mod message;
pub mod post;

pub use message::{Message, UpdateSummary, SUCCESS};
pub use post::{Post, ID_FIELD};
