use std::collections::BTreeMap;
use std::path::Path;

use parking_lot::Mutex;

use folio::engine::{Engine, OpenedIndex, RawHit};
use folio::transpose::FieldPairs;
use folio::{
    Document, FieldType, FieldValue, FolioError, IndexHandle, SchemaDefinition, SessionState,
};

/// In-memory engine that records what it is given.
#[derive(Debug, Default)]
struct RecordingEngine {
    fail_commit: bool,
}

#[derive(Debug, Default)]
struct Recorded {
    committed: Vec<FieldPairs>,
    commits: u64,
}

impl Engine for RecordingEngine {
    type Index = Mutex<Recorded>;
    type Writer = Vec<FieldPairs>;

    fn create_index(&self, _path: Option<&Path>, serialized_schema: &str) -> folio::Result<Self::Index> {
        folio::schema::codec::parse(serialized_schema)?;
        Ok(Mutex::new(Recorded::default()))
    }

    fn open_index(&self, path: &Path) -> folio::Result<OpenedIndex<Self::Index>> {
        Err(FolioError::NotFound(path.to_path_buf()))
    }

    fn writer_open(&self, _index: &Self::Index) -> folio::Result<Self::Writer> {
        Ok(Vec::new())
    }

    fn writer_add_document(
        &self,
        _index: &Self::Index,
        writer: &mut Self::Writer,
        pairs: FieldPairs,
    ) -> folio::Result<()> {
        writer.push(pairs);
        Ok(())
    }

    fn writer_commit(&self, index: &Self::Index, writer: &mut Self::Writer) -> folio::Result<u64> {
        if self.fail_commit {
            return Err(FolioError::engine("disk full"));
        }
        let mut recorded = index.lock();
        recorded.committed.append(writer);
        recorded.commits += 1;
        Ok(recorded.commits)
    }

    fn query(&self, index: &Self::Index, _text: &str, limit: usize) -> folio::Result<Vec<RawHit>> {
        // Every committed document matches, later ones scoring higher.
        let recorded = index.lock();
        Ok(recorded
            .committed
            .iter()
            .enumerate()
            .take(limit)
            .map(|(i, pairs)| {
                let mut fields: BTreeMap<String, Vec<FieldValue>> = BTreeMap::new();
                for (name, value) in pairs {
                    fields.entry(name.clone()).or_default().push(value.clone());
                }
                RawHit {
                    score: i as f32,
                    fields,
                }
            })
            .collect())
    }
}

fn schema() -> folio::Result<SchemaDefinition> {
    SchemaDefinition::builder()
        .add_text_field("title", Some("default"), true)
        .add_text_field("body", Some("default"), false)
        .add_numeric_field("year", FieldType::U64, true, true)
        .build()
}

fn recording_index(fail_commit: bool) -> folio::Result<IndexHandle<RecordingEngine>> {
    IndexHandle::create_in_ram_with(RecordingEngine { fail_commit }, &schema()?)
}

fn doc(title: &str) -> Document {
    Document::new().add_text("title", title).add_text("body", "text")
}

fn committed_documents(index: &IndexHandle<RecordingEngine>) -> usize {
    index.query_with_limit("*", 100).map(|r| r.len()).unwrap_or(0)
}

#[test]
fn test_second_session_is_rejected() -> folio::Result<()> {
    let index = recording_index(false)?;

    let writer = index.writer()?;
    assert!(index.has_active_writer());
    assert!(matches!(index.writer(), Err(FolioError::AlreadyActive)));

    drop(writer);
    assert!(!index.has_active_writer());
    let _writer = index.writer()?;
    Ok(())
}

#[test]
fn test_repeated_commit_returns_same_ack() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;
    writer.add_document(doc("one"))?;

    let first = writer.commit()?;
    let second = writer.commit()?;
    assert_eq!(first, second);
    assert_eq!(first.opstamp(), 1);
    assert_eq!(first.documents(), 1);
    assert_eq!(first.session(), writer.token());
    assert_eq!(writer.state(), SessionState::Committed);
    Ok(())
}

#[test]
fn test_add_after_commit_is_invalid() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;
    writer.commit()?;

    let err = writer.add_document(doc("late")).unwrap_err();
    assert!(matches!(err, FolioError::InvalidState(_)));
    Ok(())
}

#[test]
fn test_commit_with_nothing_staged() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;

    let ack = writer.commit()?;
    assert_eq!(ack.documents(), 0);
    assert_eq!(committed_documents(&index), 0);
    Ok(())
}

#[test]
fn test_failed_commit_poisons_session() -> folio::Result<()> {
    let index = recording_index(true)?;
    let mut writer = index.writer()?;
    writer.add_document(doc("one"))?;

    let err = writer.commit().unwrap_err();
    assert!(matches!(err, FolioError::Engine(_)));
    assert_eq!(writer.state(), SessionState::Failed);

    assert!(matches!(writer.commit(), Err(FolioError::InvalidState(_))));
    assert!(matches!(
        writer.add_document(doc("two")),
        Err(FolioError::InvalidState(_))
    ));

    // The slot is released once the failed session goes away.
    drop(writer);
    let _writer = index.writer()?;
    Ok(())
}

#[test]
fn test_unknown_field_is_not_staged() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;

    let err = writer
        .add_document(Document::new().add_text("unknownField", "x"))
        .unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    assert_eq!(writer.staged(), 0);

    writer.add_document(doc("ok"))?;
    assert_eq!(writer.commit()?.documents(), 1);
    drop(writer);

    assert_eq!(committed_documents(&index), 1);
    Ok(())
}

#[test]
fn test_value_kind_must_fit_field_type() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;

    let err = writer
        .add_document(Document::new().add_text("year", "last year"))
        .unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));

    let err = writer
        .add_document(Document::new().add_field("year", -1))
        .unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    writer.add_document(Document::new().add_field("year", 2021))?;
    assert_eq!(writer.staged(), 1);
    Ok(())
}

#[test]
fn test_add_documents_keeps_earlier_documents_staged() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;

    let docs = vec![
        doc("one"),
        doc("two"),
        Document::new().add_text("nope", "x"),
        doc("four"),
    ];
    let err = writer.add_documents(docs).unwrap_err();
    assert!(matches!(err, FolioError::Validation(_)));
    assert_eq!(writer.staged(), 2);

    assert_eq!(writer.commit()?.documents(), 2);
    drop(writer);
    assert_eq!(committed_documents(&index), 2);
    Ok(())
}

#[test]
fn test_abandoned_session_commits_nothing() -> folio::Result<()> {
    let index = recording_index(false)?;
    {
        let mut writer = index.writer()?;
        writer.add_document(doc("lost"))?;
    }
    assert!(index.query("*")?.is_empty());
    Ok(())
}

#[test]
fn test_results_hide_unstored_fields_and_sort_by_score() -> folio::Result<()> {
    let index = recording_index(false)?;
    let mut writer = index.writer()?;
    writer.add_documents(vec![doc("low"), doc("mid"), doc("high")])?;
    writer.commit()?;
    drop(writer);

    let results = index.query_with_limit("*", 2)?;
    let titles: Vec<_> = results.values_of("title").filter_map(|v| v.as_text()).collect();
    assert_eq!(titles, vec!["mid", "low"]);

    let results = index.query("*")?;
    let titles: Vec<_> = results.values_of("title").filter_map(|v| v.as_text()).collect();
    assert_eq!(titles, vec!["high", "mid", "low"]);
    assert!(results.iter().all(|doc| doc.get("body").is_none()));
    Ok(())
}

#[test]
fn test_uncommitted_documents_are_not_visible_in_tantivy() -> folio::Result<()> {
    let index = IndexHandle::create_in_ram(&schema()?)?;
    let mut writer = index.writer()?;
    writer.add_document(doc("pending"))?;

    assert!(index.query("pending")?.is_empty());

    writer.commit()?;
    assert_eq!(index.query("pending")?.len(), 1);
    Ok(())
}
