//! Core types - paths, scopes and unique naming shared across the crate.

mod path;
mod scope;
mod unique;

pub use path::{RoutePath, segments, validate_segment};
pub use scope::{DEFAULT_ROOT_TEMPLATE, Scope};
pub use unique::UniqueNameResolver;
