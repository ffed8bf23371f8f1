pub mod error;
pub mod module;
pub mod reference;
pub mod schema;
pub mod types;

pub use error::ServiceError;
pub use module::Module;
pub use reference::{ResourceReference, DEFAULT_PACK_NAME};
pub use types::{new_id, now_rfc3339};
