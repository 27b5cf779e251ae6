//! Narrow capability interface between the facade and a search engine.

use crate::model::Hit;

use super::descriptor::EntityDescriptor;
use super::error::{QueryError, SearchError};
use super::query::StructuredQuery;

/// One executed page: hits in rank order plus the backend's match estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitPage {
    pub hits: Vec<Hit>,
    pub estimated_total: usize,
}

/// Implemented once per installed engine. Normalization, field binding and
/// rendering all happen above this trait.
pub trait SearchBackend {
    type Query;

    fn parse_query(
        &self,
        query: &StructuredQuery,
        descriptor: &EntityDescriptor,
    ) -> Result<Self::Query, QueryError>;

    /// Run `query`, returning at most `limit` hits starting at `offset`.
    /// Scores are scaled to 0-100 against the best match of the whole query.
    fn execute(
        &self,
        query: &Self::Query,
        offset: usize,
        limit: usize,
    ) -> Result<HitPage, SearchError>;
}
