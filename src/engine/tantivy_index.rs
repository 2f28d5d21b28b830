//! [`Engine`] implementation backed by tantivy.
//!
//! Tokenizers (`default`, `raw`, `en_stem`, `whitespace`), BM25 scoring and the
//! on-disk layout are tantivy's. An index exists in a directory iff tantivy's
//! `meta.json` is present there; the schema stored in that file is translated
//! back into Folio's schema text when the index is opened.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{
    Field, FieldType as TantivyFieldType, IndexRecordOption, NumericOptions, OwnedValue,
    Schema, TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::TokenizerManager;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, TantivyError};

use crate::data::FieldValue;
use crate::engine::{Engine, OpenedIndex, RawHit};
use crate::error::{FolioError, Result};
use crate::index::config::IndexConfig;
use crate::schema::codec;
use crate::schema::{
    FieldSpec, FieldType, IndexRecord, RawFieldSpec, RawIndexingOptions, SchemaDefinition,
};
use crate::transpose::FieldPairs;

/// Name of the metadata file that marks a directory as an index.
pub const META_FILE: &str = "meta.json";

/// Tantivy-backed retrieval engine.
#[derive(Debug, Clone)]
pub struct TantivyEngine {
    memory_budget: usize,
    num_threads: Option<usize>,
}

impl TantivyEngine {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            memory_budget: config.writer_memory_budget,
            num_threads: config.writer_threads,
        }
    }

    /// Memory budget shared by the writer threads, in bytes.
    pub fn memory_budget(&self) -> usize {
        self.memory_budget
    }

    /// Number of indexing threads, `None` when tantivy decides.
    pub fn num_threads(&self) -> Option<usize> {
        self.num_threads
    }

    fn wrap(&self, index: Index) -> Result<TantivyIndex> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let schema = index.schema();

        let mut stored = Vec::new();
        let mut default_fields = Vec::new();
        for (field, entry) in schema.fields() {
            if entry.is_stored() {
                stored.push((entry.name().to_string(), field));
            }
            if let TantivyFieldType::Str(opts) = entry.field_type() {
                if opts.get_indexing_options().is_some() {
                    default_fields.push(field);
                }
            }
        }

        Ok(TantivyIndex {
            index,
            reader,
            stored,
            default_fields,
        })
    }
}

impl Default for TantivyEngine {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}

/// A tantivy index with its reader.
pub struct TantivyIndex {
    index: Index,
    reader: IndexReader,
    stored: Vec<(String, Field)>,
    default_fields: Vec<Field>,
}

impl std::fmt::Debug for TantivyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyIndex")
            .field("stored", &self.stored)
            .field("default_fields", &self.default_fields)
            .finish_non_exhaustive()
    }
}

/// An open tantivy index writer.
pub struct TantivyWriter {
    writer: IndexWriter,
}

impl std::fmt::Debug for TantivyWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyWriter").finish_non_exhaustive()
    }
}

impl Engine for TantivyEngine {
    type Index = TantivyIndex;
    type Writer = TantivyWriter;

    fn create_index(&self, path: Option<&Path>, serialized_schema: &str) -> Result<TantivyIndex> {
        let definition = codec::parse(serialized_schema)?;
        check_tokenizers(&definition)?;
        let schema = build_schema(&definition)?;

        let index = match path {
            Some(path) => {
                if !path.is_dir() {
                    return Err(FolioError::NotFound(path.to_path_buf()));
                }
                if path.join(META_FILE).exists() {
                    return Err(FolioError::PathConflict(path.to_path_buf()));
                }
                Index::create_in_dir(path, schema).map_err(|e| match e {
                    TantivyError::IndexAlreadyExists => FolioError::PathConflict(path.to_path_buf()),
                    other => FolioError::from(other),
                })?
            }
            None => Index::create_in_ram(schema),
        };

        info!(
            "created tantivy index ({} fields) at {}",
            definition.len(),
            path.map(|p| p.display().to_string())
                .unwrap_or_else(|| "<memory>".to_string())
        );
        self.wrap(index)
    }

    fn open_index(&self, path: &Path) -> Result<OpenedIndex<TantivyIndex>> {
        if !path.join(META_FILE).is_file() {
            return Err(FolioError::NotFound(path.to_path_buf()));
        }

        let index = Index::open_in_dir(path)?;
        let definition = SchemaDefinition::validate(raw_fields(&index.schema())?)?;
        let serialized_schema = codec::serialize(&definition)?;
        info!("opened tantivy index at {}", path.display());

        Ok(OpenedIndex {
            index: self.wrap(index)?,
            serialized_schema,
        })
    }

    fn writer_open(&self, index: &TantivyIndex) -> Result<TantivyWriter> {
        let writer: IndexWriter = match self.num_threads {
            Some(threads) => index
                .index
                .writer_with_num_threads(threads, self.memory_budget)?,
            None => index.index.writer(self.memory_budget)?,
        };
        Ok(TantivyWriter { writer })
    }

    fn writer_add_document(
        &self,
        index: &TantivyIndex,
        writer: &mut TantivyWriter,
        pairs: FieldPairs,
    ) -> Result<()> {
        let schema = index.index.schema();
        let mut doc = TantivyDocument::default();

        for (name, value) in pairs {
            let field = schema.get_field(&name)?;
            let field_type = schema.get_field_entry(field).field_type();
            match (field_type, value) {
                (TantivyFieldType::Str(_), FieldValue::Text(text)) => doc.add_text(field, &text),
                (TantivyFieldType::U64(_), FieldValue::U64(v)) => doc.add_u64(field, v),
                (TantivyFieldType::I64(_), FieldValue::I64(v)) => doc.add_i64(field, v),
                (TantivyFieldType::F64(_), FieldValue::F64(v)) => doc.add_f64(field, v),
                (_, value) => {
                    return Err(FolioError::engine(format!(
                        "value of kind {} does not match the type of field '{name}'",
                        value.kind()
                    )));
                }
            }
        }

        writer.writer.add_document(doc)?;
        Ok(())
    }

    fn writer_commit(&self, index: &TantivyIndex, writer: &mut TantivyWriter) -> Result<u64> {
        let opstamp = writer.writer.commit()?;
        // Manual reload policy: refresh here so the commit is visible on return.
        index.reader.reload()?;
        debug!("tantivy commit at opstamp {opstamp}");
        Ok(opstamp)
    }

    fn query(&self, index: &TantivyIndex, text: &str, limit: usize) -> Result<Vec<RawHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let parser = QueryParser::for_index(&index.index, index.default_fields.clone());
        let query = parser
            .parse_query(text)
            .map_err(|e| FolioError::query(format!("{e} in '{text}'")))?;

        // Other handles may have committed to the same directory.
        index.reader.reload()?;
        let searcher = index.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let mut fields = BTreeMap::new();
            for (name, field) in &index.stored {
                let values: Vec<FieldValue> = doc.get_all(*field).filter_map(to_field_value).collect();
                if !values.is_empty() {
                    fields.insert(name.clone(), values);
                }
            }
            hits.push(RawHit { score, fields });
        }

        Ok(hits)
    }
}

fn to_field_value(value: &OwnedValue) -> Option<FieldValue> {
    match value {
        OwnedValue::Str(s) => Some(FieldValue::Text(s.clone())),
        OwnedValue::U64(v) => Some(FieldValue::U64(*v)),
        OwnedValue::I64(v) => Some(FieldValue::I64(*v)),
        OwnedValue::F64(v) => Some(FieldValue::F64(*v)),
        _ => None,
    }
}

fn record_option(record: IndexRecord) -> IndexRecordOption {
    match record {
        IndexRecord::Basic => IndexRecordOption::Basic,
        IndexRecord::Freq => IndexRecordOption::WithFreqs,
        IndexRecord::Position => IndexRecordOption::WithFreqsAndPositions,
    }
}

fn record_mode(option: IndexRecordOption) -> IndexRecord {
    match option {
        IndexRecordOption::Basic => IndexRecord::Basic,
        IndexRecordOption::WithFreqs => IndexRecord::Freq,
        IndexRecordOption::WithFreqsAndPositions => IndexRecord::Position,
    }
}

/// Translate a Folio schema into a tantivy schema.
fn build_schema(definition: &SchemaDefinition) -> Result<Schema> {
    let mut builder = Schema::builder();

    for spec in definition.fields() {
        // tantivy panics on these names rather than returning an error.
        if spec.name().starts_with('-') {
            return Err(FolioError::schema(format!(
                "field name '{}' must not start with '-'",
                spec.name()
            )));
        }

        match spec.field_type() {
            FieldType::Text => {
                builder.add_text_field(spec.name(), text_options(spec));
            }
            FieldType::U64 => {
                builder.add_u64_field(spec.name(), numeric_options(spec));
            }
            FieldType::I64 => {
                builder.add_i64_field(spec.name(), numeric_options(spec));
            }
            FieldType::F64 => {
                builder.add_f64_field(spec.name(), numeric_options(spec));
            }
        }
    }

    Ok(builder.build())
}

fn text_options(spec: &FieldSpec) -> TextOptions {
    let mut options = TextOptions::default();
    if let Some(indexing) = spec.indexing() {
        let tokenizer = indexing.tokenizer.as_deref().unwrap_or("default");
        options = options.set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(tokenizer)
                .set_index_option(record_option(indexing.record)),
        );
    }
    if spec.is_stored() {
        options = options.set_stored();
    }
    options
}

fn numeric_options(spec: &FieldSpec) -> NumericOptions {
    let mut options = NumericOptions::default();
    if spec.is_indexed() {
        options = options.set_indexed();
    }
    if spec.is_stored() {
        options = options.set_stored();
    }
    options
}

/// Tokenizer names must be known before anything is written to disk.
fn check_tokenizers(definition: &SchemaDefinition) -> Result<()> {
    let tokenizers = TokenizerManager::default();
    for spec in definition.fields() {
        if let Some(name) = spec.indexing().and_then(|i| i.tokenizer.as_deref()) {
            if tokenizers.get(name).is_none() {
                return Err(FolioError::schema(format!(
                    "field '{}': unknown tokenizer '{name}'",
                    spec.name()
                )));
            }
        }
    }
    Ok(())
}

/// Translate a tantivy schema back into raw Folio field records.
fn raw_fields(schema: &Schema) -> Result<Vec<RawFieldSpec>> {
    schema
        .fields()
        .map(|(_, entry)| {
            let (field_type, indexing) = match entry.field_type() {
                TantivyFieldType::Str(opts) => (
                    FieldType::Text,
                    opts.get_indexing_options().map(|indexing| RawIndexingOptions {
                        record: Some(record_mode(indexing.index_option()).as_str().to_string()),
                        tokenizer: Some(indexing.tokenizer().to_string()),
                    }),
                ),
                TantivyFieldType::U64(opts) => (FieldType::U64, numeric_indexing(opts)),
                TantivyFieldType::I64(opts) => (FieldType::I64, numeric_indexing(opts)),
                TantivyFieldType::F64(opts) => (FieldType::F64, numeric_indexing(opts)),
                other => {
                    return Err(FolioError::engine(format!(
                        "field '{}' has unsupported type {:?}",
                        entry.name(),
                        other.value_type()
                    )));
                }
            };

            let mut raw = RawFieldSpec::new(entry.name(), field_type.as_str());
            raw.options.indexing = indexing;
            raw.options.stored = entry.is_stored();
            Ok(raw)
        })
        .collect()
}

fn numeric_indexing(opts: &NumericOptions) -> Option<RawIndexingOptions> {
    opts.is_indexed().then(|| RawIndexingOptions {
        record: Some(IndexRecord::Basic.as_str().to_string()),
        tokenizer: None,
    })
}
