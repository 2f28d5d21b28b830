//! Query execution and result shaping.
//!
//! The query text goes to the engine's parser unchanged; Folio does not
//! interpret it. What comes back is trimmed to the stored fields of the schema,
//! ordered by descending score and cut at the limit.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::FieldValue;
use crate::engine::{Engine, RawHit, TantivyEngine};
use crate::error::Result;
use crate::index::IndexHandle;

/// One matching document.
///
/// Serializes as a plain map from stored field name to its values; the score
/// is kept out of the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    #[serde(skip)]
    score: f32,
    #[serde(flatten)]
    fields: BTreeMap<String, Vec<FieldValue>>,
}

impl ResultDocument {
    pub fn new(score: f32, fields: BTreeMap<String, Vec<FieldValue>>) -> Self {
        Self { score, fields }
    }

    /// Relevance score reported by the engine.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// All values of a stored field. Never an empty slice.
    pub fn get(&self, name: &str) -> Option<&[FieldValue]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn first(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).and_then(|values| values.first())
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<FieldValue>> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, Vec<FieldValue>> {
        self.fields
    }
}

/// Ordered query results, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult {
    documents: Vec<ResultDocument>,
}

impl QueryResult {
    pub fn documents(&self) -> &[ResultDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultDocument> {
        self.documents.iter()
    }

    /// First value of `field` in every result that has one, in result order.
    pub fn values_of<'r>(&'r self, field: &'r str) -> impl Iterator<Item = &'r FieldValue> + 'r {
        self.documents.iter().filter_map(move |doc| doc.first(field))
    }
}

impl IntoIterator for QueryResult {
    type Item = ResultDocument;
    type IntoIter = std::vec::IntoIter<ResultDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'r> IntoIterator for &'r QueryResult {
    type Item = &'r ResultDocument;
    type IntoIter = std::slice::Iter<'r, ResultDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Runs text queries against an [`IndexHandle`].
///
/// ```rust,no_run
/// # use folio::{IndexHandle, QueryExecutor, SchemaDefinition};
/// # let schema = SchemaDefinition::builder().add_text_field("title", Some("en_stem"), true).build()?;
/// # let index = IndexHandle::create_in_ram(&schema)?;
/// let results = QueryExecutor::new(&index).limit(5).query("title:hello")?;
/// for doc in &results {
///     println!("{:.3} {:?}", doc.score(), doc.fields());
/// }
/// # Ok::<(), folio::FolioError>(())
/// ```
pub struct QueryExecutor<'a, E: Engine = TantivyEngine> {
    handle: &'a IndexHandle<E>,
    limit: usize,
}

impl<'a, E: Engine> QueryExecutor<'a, E> {
    /// Executor using the handle's configured default limit.
    pub fn new(handle: &'a IndexHandle<E>) -> Self {
        Self {
            handle,
            limit: handle.default_limit(),
        }
    }

    /// Return at most `limit` documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Run `text` through the engine's query parser.
    ///
    /// Fails with [`FolioError::Query`](crate::FolioError::Query) on malformed
    /// query text and with [`FolioError::InvalidState`](crate::FolioError::InvalidState)
    /// if the handle is disposed. Only committed documents are guaranteed to
    /// be visible.
    pub fn query(&self, text: &str) -> Result<QueryResult> {
        let hits = self.handle.with_index(|engine, index| {
            if self.limit == 0 {
                return Ok(Vec::new());
            }
            engine.query(index, text, self.limit)
        })?;

        let result = self.shape(hits);
        debug!("query '{text}' returned {} documents", result.len());
        Ok(result)
    }

    fn shape(&self, mut hits: Vec<RawHit>) -> QueryResult {
        let schema = self.handle.schema();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.limit);

        let documents = hits
            .into_iter()
            .map(|hit| {
                let fields = hit
                    .fields
                    .into_iter()
                    .filter(|(name, values)| {
                        !values.is_empty() && schema.field(name).is_some_and(|f| f.is_stored())
                    })
                    .collect();
                ResultDocument::new(hit.score, fields)
            })
            .collect();

        QueryResult { documents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_as_field_maps() {
        let mut fields = BTreeMap::new();
        fields.insert("url".to_string(), vec![FieldValue::from("a:1")]);
        let result = QueryResult {
            documents: vec![ResultDocument::new(1.5, fields)],
        };

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"[{"url":["a:1"]}]"#);
    }

    #[test]
    fn test_values_of() {
        let docs = ["a:1", "a:2"]
            .iter()
            .map(|url| {
                let mut fields = BTreeMap::new();
                fields.insert("url".to_string(), vec![FieldValue::from(*url)]);
                ResultDocument::new(1.0, fields)
            })
            .collect();
        let result = QueryResult { documents: docs };

        let urls: Vec<_> = result.values_of("url").filter_map(|v| v.as_text()).collect();
        assert_eq!(urls, vec!["a:1", "a:2"]);
    }
}
