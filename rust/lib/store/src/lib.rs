//! Document persistence over `eventide-kv` and the generic REST controller
//! built on it.

pub mod access;
pub mod document;
pub mod query;
pub mod resource;

pub use access::{Access, QueryResult};
pub use document::{require_fields, Document, UniqueKey};
pub use query::{Direction, Query, SortKey};
pub use resource::{Resource, ResourceController, HEADER_LIMIT, HEADER_TOTAL_COUNT, MAX_PAGE_LIMIT};
