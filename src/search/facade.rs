//! Per-entity search facade: normalize, bind, execute one page, render.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::indexer::GenerationLayout;
use crate::model::{EntityType, OutputFormat, ResultPage, SearchOutcome};
use crate::render::RenderOptions;

use super::backend::SearchBackend;
use super::descriptor::{EntityDescriptor, descriptor};
use super::error::SearchFailure;
use super::normalize::normalize;
use super::query::build;
use super::tantivy::TantivyBackend;

/// Page size used when the caller asks for fewer than one hit.
pub const DEFAULT_MAX_HITS: usize = 25;

/// Target for slow and failed query events.
pub const QUERY_LOG_TARGET: &str = "mbsearch::query_log";

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub render: RenderOptions,
    /// Queries slower than this are reported on the query log target.
    pub slow_query: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            slow_query: Duration::from_millis(1000),
        }
    }
}

pub struct EntitySearch<B: SearchBackend> {
    backend: B,
    descriptor: &'static EntityDescriptor,
    options: SearchOptions,
}

impl<B: SearchBackend> EntitySearch<B> {
    pub fn new(backend: B, descriptor: &'static EntityDescriptor, options: SearchOptions) -> Self {
        Self {
            backend,
            descriptor,
            options,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.descriptor.entity
    }

    /// Run one page of `raw` and classify the result.
    ///
    /// Zero estimated matches is reported as [`SearchFailure::NoResults`]
    /// rather than an empty page.
    pub fn query(&self, raw: &[u8], max_hits: i64, offset: usize) -> Result<SearchOutcome, SearchFailure> {
        let limit = usize::try_from(max_hits)
            .ok()
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_MAX_HITS);
        let start = Instant::now();

        let normalized = normalize(raw, self.descriptor)?;
        let structured = build(&normalized, self.descriptor)?;
        debug!(entity = %self.entity(), query = %structured, "structured query");
        let backend_query = self.backend.parse_query(&structured, self.descriptor)?;

        let page = match self.backend.execute(&backend_query, offset, limit) {
            Ok(page) => page,
            Err(err) => {
                warn!(
                    target: QUERY_LOG_TARGET,
                    entity = %self.entity(),
                    query = %normalized,
                    error = %err,
                    "search_failed"
                );
                return Err(err.into());
            }
        };

        let elapsed = start.elapsed();
        if elapsed > self.options.slow_query {
            warn!(
                target: QUERY_LOG_TARGET,
                entity = %self.entity(),
                query = %normalized,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow_query"
            );
        }

        // A sole match still redirects when the requested page starts past it.
        let lead = if page.estimated_total == 1 && page.hits.is_empty() {
            self.backend
                .execute(&backend_query, 0, 1)
                .map_err(SearchFailure::from)?
                .hits
                .into_iter()
                .next()
        } else {
            None
        };

        match SearchOutcome::from_page_with_lead(
            ResultPage {
                hits: page.hits,
                estimated_total: page.estimated_total,
                offset,
            },
            lead.as_ref(),
        ) {
            SearchOutcome::Empty => Err(SearchFailure::NoResults),
            outcome => Ok(outcome),
        }
    }

    /// Run a query and render it in `format`.
    pub fn search(
        &self,
        raw: &[u8],
        max_hits: i64,
        offset: usize,
        format: OutputFormat,
    ) -> Result<Vec<u8>, SearchFailure> {
        let (page, redirect) = match self.query(raw, max_hits, offset)? {
            SearchOutcome::Redirect { id, page } => (page, Some(id)),
            SearchOutcome::Page(page) => (page, None),
            SearchOutcome::Empty => return Err(SearchFailure::NoResults),
        };
        Ok(self.render(&page, redirect.as_deref(), format).into_bytes())
    }

    fn render(&self, page: &ResultPage, redirect: Option<&str>, format: OutputFormat) -> String {
        match format {
            OutputFormat::Xml => (self.descriptor.render_xml)(page, &self.options.render),
            OutputFormat::Html => {
                let mut out = format!("<!--\nhits={}\noffset={}\n", page.estimated_total, page.offset);
                if let Some(id) = redirect {
                    out.push_str(&format!("redirect={id}\n"));
                }
                out.push_str("-->");
                out.push_str(&(self.descriptor.render_html)(page, &self.options.render));
                out
            }
        }
    }
}

impl EntitySearch<TantivyBackend> {
    /// Open `entity`'s index inside one generation directory.
    pub fn open(generation: &Path, entity: EntityType, options: SearchOptions) -> Result<Self, SearchFailure> {
        let path = generation.join(entity.name());
        let d = descriptor(entity);
        let backend = TantivyBackend::open(&path, d).map_err(|e| SearchFailure::NoSuchIndex {
            path: path.clone(),
            reason: format!("{e:#}"),
        })?;
        Ok(Self::new(backend, d, options))
    }

    /// Open `entity`'s index in the newest published generation of `label`.
    pub fn open_current(
        layout: &GenerationLayout,
        label: &str,
        entity: EntityType,
        options: SearchOptions,
    ) -> Result<Self, SearchFailure> {
        let label_dir = layout.label_dir(label);
        match layout.current(label) {
            Ok(Some(generation)) => Self::open(&generation, entity, options),
            Ok(None) => Err(SearchFailure::NoSuchIndex {
                path: label_dir,
                reason: "no published generation".to_string(),
            }),
            Err(e) => Err(SearchFailure::NoSuchIndex {
                path: label_dir,
                reason: e.to_string(),
            }),
        }
    }
}
