//! Search layer.
//!
//! - **[`normalize`]**: raw query bytes to normalized text.
//! - **[`query`]**: normalized text to a backend-neutral structured query.
//! - **[`descriptor`]**: per-entity fields, defaults, legacy rewrites and renderers.
//! - **[`backend`]**: the capability trait an engine implements.
//! - **[`tantivy`]**: the Tantivy engine, writer and reader side.
//! - **[`facade`]**: [`facade::EntitySearch`], one `search` call per query.

pub mod backend;
pub mod descriptor;
pub mod error;
pub mod facade;
pub mod normalize;
pub mod query;
pub mod tantivy;

pub use error::{QueryError, SearchError, SearchFailure};
