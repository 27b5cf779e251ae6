use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{
    BooleanQuery, Occur as TantivyOccur, PhraseQuery, Query, RegexQuery, TermQuery,
};
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::tokenizer::{
    AsciiFoldingFilter, LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream,
};
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, Term};

use crate::model::Hit;

use super::backend::{HitPage, SearchBackend};
use super::descriptor::{EntityDescriptor, FieldKind};
use super::error::{QueryError, SearchError};
use super::normalize::index_form;
use super::query::{Clause, FieldBinding, Occur, QueryNode, StructuredQuery};

/// Analyzer name registered on every index this crate creates or opens.
pub const TOKENIZER: &str = "mbsearch_text";

/// Stored JSON copy of the source record, echoed back in hits.
const DOCUMENT_FIELD: &str = "_document";

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub fn text_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(64))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

pub fn build_schema(descriptor: &EntityDescriptor) -> Schema {
    let text = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );
    let mut schema_builder = Schema::builder();
    for spec in descriptor.fields {
        match spec.kind {
            FieldKind::Text => schema_builder.add_text_field(spec.name, text.clone()),
            FieldKind::Identifier => schema_builder.add_text_field(spec.name, STRING),
        };
    }
    schema_builder.add_text_field(DOCUMENT_FIELD, STORED);
    schema_builder.build()
}

/// Identifiers are matched lowercase and without dashes on both sides.
pub fn identifier_form(value: &str) -> String {
    value.trim().to_lowercase().replace('-', "")
}

#[derive(Clone)]
struct Fields {
    by_name: HashMap<&'static str, (Field, FieldKind)>,
    document: Field,
}

fn fields_from_schema(schema: &Schema, descriptor: &EntityDescriptor) -> Result<Fields> {
    let mut by_name = HashMap::new();
    for spec in descriptor.fields {
        let field = schema
            .get_field(spec.name)
            .with_context(|| format!("schema missing {}", spec.name))?;
        by_name.insert(spec.name, (field, spec.kind));
    }
    let document = schema
        .get_field(DOCUMENT_FIELD)
        .with_context(|| format!("schema missing {DOCUMENT_FIELD}"))?;
    Ok(Fields { by_name, document })
}

/// Writes one entity's index inside a generation being built.
pub struct GenerationWriter {
    writer: IndexWriter,
    fields: Fields,
    descriptor: &'static EntityDescriptor,
    added: u64,
}

impl GenerationWriter {
    pub fn create(path: &Path, descriptor: &'static EntityDescriptor) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating index dir {}", path.display()))?;
        let schema = build_schema(descriptor);
        let index = Index::create_in_dir(path, schema.clone())
            .with_context(|| format!("creating {} index at {}", descriptor.entity, path.display()))?;
        index.tokenizers().register(TOKENIZER, text_analyzer());
        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .with_context(|| "create index writer")?;
        let fields = fields_from_schema(&schema, descriptor)?;
        Ok(Self {
            writer,
            fields,
            descriptor,
            added: 0,
        })
    }

    /// Index one record. Values of fields the entity does not declare are
    /// kept for display but not searchable.
    pub fn add_record(&mut self, record: &BTreeMap<String, Vec<String>>) -> Result<()> {
        let mut doc = TantivyDocument::default();
        for (name, values) in record {
            let Some((field, kind)) = self.fields.by_name.get(name.as_str()) else {
                continue;
            };
            let strip_zeros = self.descriptor.strip_leading_zeros.contains(&name.as_str());
            for value in values {
                let value = if strip_zeros {
                    strip_leading_zeros(value.trim())
                } else {
                    value.as_str()
                };
                match kind {
                    FieldKind::Text => doc.add_text(*field, index_form(value)),
                    FieldKind::Identifier => doc.add_text(*field, identifier_form(value)),
                }
            }
        }
        doc.add_text(self.fields.document, serde_json::to_string(record)?);
        self.writer.add_document(doc)?;
        self.added += 1;
        Ok(())
    }

    /// Commit and return the number of documents written.
    pub fn commit(mut self) -> Result<u64> {
        self.writer
            .commit()
            .with_context(|| format!("committing {} index", self.descriptor.entity))?;
        self.writer.wait_merging_threads()?;
        Ok(self.added)
    }
}

/// `00123` -> `123`, `000` -> `0`; queries get the same treatment.
fn strip_leading_zeros(value: &str) -> &str {
    let trimmed = value.trim_start_matches('0');
    if trimmed.len() < value.len() && !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        &value[value.len() - trimmed.len() - 1..]
    } else {
        trimmed
    }
}

/// Read-only view of one entity index of a published generation.
pub struct TantivyBackend {
    reader: IndexReader,
    fields: Fields,
    analyzer: TextAnalyzer,
}

impl TantivyBackend {
    pub fn open(path: &Path, descriptor: &EntityDescriptor) -> Result<Self> {
        let index = Index::open_in_dir(path)
            .with_context(|| format!("opening index at {}", path.display()))?;
        index.tokenizers().register(TOKENIZER, text_analyzer());
        let fields = fields_from_schema(&index.schema(), descriptor)?;
        let reader = index.reader().with_context(|| "create index reader")?;
        Ok(Self {
            reader,
            fields,
            analyzer: text_analyzer(),
        })
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        stream.process(&mut |token| tokens.push(token.text.clone()));
        tokens
    }

    fn field(&self, name: &str) -> Result<(Field, FieldKind), QueryError> {
        self.fields
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| QueryError::Syntax(format!("field {name} is not indexed")))
    }

    fn clauses_query(
        &self,
        clauses: &[Clause],
        descriptor: &EntityDescriptor,
    ) -> Result<Option<Box<dyn Query>>, QueryError> {
        let mut parts: Vec<(TantivyOccur, Box<dyn Query>)> = Vec::new();
        for clause in clauses {
            if let Some(q) = self.node_query(&clause.node, descriptor)? {
                let occur = match clause.occur {
                    Occur::Should => TantivyOccur::Should,
                    Occur::Must => TantivyOccur::Must,
                    Occur::MustNot => TantivyOccur::MustNot,
                };
                parts.push((occur, q));
            }
        }
        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(BooleanQuery::new(parts))))
    }

    fn node_query(
        &self,
        node: &QueryNode,
        descriptor: &EntityDescriptor,
    ) -> Result<Option<Box<dyn Query>>, QueryError> {
        let (binding, leaf) = match node {
            QueryNode::Group(clauses) => return self.clauses_query(clauses, descriptor),
            QueryNode::Term { field, text } | QueryNode::Phrase { field, text } => {
                (field, Leaf::Text(text))
            }
            QueryNode::Wildcard { field, pattern } => (field, Leaf::Pattern(pattern)),
        };
        let names: Vec<&str> = match binding {
            FieldBinding::Default => descriptor.default_fields.to_vec(),
            FieldBinding::Field(name) => vec![name],
        };
        let mut alternatives: Vec<(TantivyOccur, Box<dyn Query>)> = Vec::new();
        for name in names {
            let (field, kind) = self.field(name)?;
            let q = match leaf {
                Leaf::Text(text) => self.text_query(field, kind, text),
                Leaf::Pattern(pattern) => Some(wildcard_query(field, pattern)?),
            };
            if let Some(q) = q {
                alternatives.push((TantivyOccur::Should, q));
            }
        }
        Ok(match alternatives.len() {
            0 => None,
            1 => alternatives.pop().map(|(_, q)| q),
            _ => Some(Box::new(BooleanQuery::new(alternatives))),
        })
    }

    fn text_query(&self, field: Field, kind: FieldKind, text: &str) -> Option<Box<dyn Query>> {
        if kind == FieldKind::Identifier {
            let term = Term::from_field_text(field, &identifier_form(text));
            return Some(Box::new(TermQuery::new(term, IndexRecordOption::Basic)));
        }
        let mut terms: Vec<Term> = self
            .analyze(text)
            .iter()
            .map(|t| Term::from_field_text(field, t))
            .collect();
        match terms.len() {
            0 => None,
            1 => terms
                .pop()
                .map(|t| Box::new(TermQuery::new(t, IndexRecordOption::WithFreqs)) as Box<dyn Query>),
            _ => Some(Box::new(PhraseQuery::new(terms))),
        }
    }
}

#[derive(Clone, Copy)]
enum Leaf<'a> {
    Text(&'a str),
    Pattern(&'a str),
}

fn wildcard_query(field: Field, pattern: &str) -> Result<Box<dyn Query>, QueryError> {
    let mut regex = String::with_capacity(pattern.len() * 2);
    for c in pattern.to_lowercase().chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    RegexQuery::from_pattern(&regex, field)
        .map(|q| Box::new(q) as Box<dyn Query>)
        .map_err(|e| QueryError::Syntax(format!("bad wildcard {pattern}: {e}")))
}

impl SearchBackend for TantivyBackend {
    type Query = Box<dyn Query>;

    fn parse_query(
        &self,
        query: &StructuredQuery,
        descriptor: &EntityDescriptor,
    ) -> Result<Self::Query, QueryError> {
        self.clauses_query(&query.clauses, descriptor)?
            .ok_or(QueryError::Empty)
    }

    fn execute(
        &self,
        query: &Self::Query,
        offset: usize,
        limit: usize,
    ) -> Result<HitPage, SearchError> {
        let searcher = self.reader.searcher();
        let estimated_total = searcher
            .search(query.as_ref(), &Count)
            .map_err(|e| SearchError::with_source("index search failed", e))?;
        if offset >= estimated_total || limit == 0 {
            return Ok(HitPage {
                hits: Vec::new(),
                estimated_total,
            });
        }

        // The collector preallocates its limit, so never ask for more than exists.
        let limit = limit.min(estimated_total - offset);
        let top_docs = searcher
            .search(query.as_ref(), &TopDocs::with_limit(limit).and_offset(offset))
            .map_err(|e| SearchError::with_source("index search failed", e))?;
        let top_score = if offset == 0 {
            top_docs.first().map_or(0.0, |(score, _)| *score)
        } else {
            searcher
                .search(query.as_ref(), &TopDocs::with_limit(1))
                .map_err(|e| SearchError::with_source("index search failed", e))?
                .first()
                .map_or(0.0, |(score, _)| *score)
        };

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(addr)
                .map_err(|e| SearchError::with_source("reading stored document", e))?;
            let fields = match doc.get_first(self.fields.document).and_then(|v| v.as_str()) {
                Some(json) => serde_json::from_str(json)
                    .map_err(|e| SearchError::with_source("decoding stored document", e))?,
                None => BTreeMap::new(),
            };
            hits.push(Hit {
                score: scale_score(score, top_score),
                fields,
            });
        }
        Ok(HitPage {
            hits,
            estimated_total,
        })
    }
}

/// Map a raw score onto 0-100 relative to the best match.
pub fn scale_score(score: f32, top_score: f32) -> u32 {
    if top_score <= 0.0 {
        return 0;
    }
    ((score / top_score) * 100.0).round().clamp(0.0, 100.0) as u32
}
