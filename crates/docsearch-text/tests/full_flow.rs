use docsearch_core::error::Error;
use docsearch_core::traits::{IndexSink, IndexStore};
use docsearch_core::types::{Document, FieldClause, IndexedDocument, MatchOperator, SearchField, StoreQuery, TagSet};
use docsearch_text::TantivyStore;
use tempfile::TempDir;

fn doc(id: &str, title: &str, body: &str, tags: &[&str], expanded: Option<&str>) -> IndexedDocument {
    IndexedDocument {
        document: Document {
            doc_id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        },
        expanded_text: expanded.map(str::to_string),
    }
}

fn corpus() -> Vec<IndexedDocument> {
    vec![
        doc("m1", "The Notebook", "A romance with a happy ending between two young lovers.", &["romance", "drama"], None),
        doc("m2", "Happy Feet", "Penguins dance on the ice.", &["animation"], None),
        doc("m3", "Alien", "A crew fights a creature aboard a ship.", &["horror", "sci-fi"], Some("love story in outer space")),
    ]
}

fn weighted(text: &str, size: usize) -> StoreQuery {
    StoreQuery {
        text: text.to_string(),
        clauses: vec![
            FieldClause { field: SearchField::Title, boost: 3.0, operator: MatchOperator::All },
            FieldClause { field: SearchField::Body, boost: 1.0, operator: MatchOperator::Any },
            FieldClause { field: SearchField::ExpandedText, boost: 0.5, operator: MatchOperator::Any },
        ],
        tags_filter: TagSet::new(),
        size,
    }
}

fn built_store(tmp: &TempDir) -> TantivyStore {
    let mut store = TantivyStore::at(tmp.path().join("index"));
    store.create_index(false).expect("create");
    let outcome = store.bulk_upsert(&corpus()).expect("bulk");
    assert_eq!(outcome.indexed, 3);
    assert!(outcome.failed.is_empty());
    store
}

#[test]
fn title_match_outranks_body_match() {
    let tmp = TempDir::new().unwrap();
    let store = built_store(&tmp);

    let resp = store.query(&weighted("happy", 10)).expect("query");
    assert_eq!(resp.total_hits, 2);
    let ids: Vec<&str> = resp.hits.iter().map(|h| h.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["m2", "m1"]);
    assert_eq!(resp.max_score, Some(resp.hits[0].score));
    assert!(resp.hits[0].score >= resp.hits[1].score);
    assert_eq!(resp.hits[1].tags.len(), 2);
    assert!(resp.hits[1].body.starts_with("A romance"));
}

#[test]
fn title_clause_requires_every_term() {
    let tmp = TempDir::new().unwrap();
    let store = built_store(&tmp);
    let title_only = |text: &str| StoreQuery {
        text: text.to_string(),
        clauses: vec![FieldClause { field: SearchField::Title, boost: 3.0, operator: MatchOperator::All }],
        tags_filter: TagSet::new(),
        size: 10,
    };

    let hit = store.query(&title_only("happy feet")).expect("query");
    assert_eq!(hit.hits.len(), 1);
    assert_eq!(hit.hits[0].doc_id, "m2");

    let miss = store.query(&title_only("happy notebook")).expect("query");
    assert!(miss.hits.is_empty());
    assert_eq!(miss.max_score, None);
}

#[test]
fn tag_filter_restricts_without_changing_scores() {
    let tmp = TempDir::new().unwrap();
    let store = built_store(&tmp);

    let unfiltered = store.query(&weighted("happy", 10)).expect("query");
    let m1_score = unfiltered.hits.iter().find(|h| h.doc_id == "m1").map(|h| h.score).expect("m1 present");

    let mut q = weighted("happy", 10);
    q.tags_filter = ["drama", "horror"].iter().map(|s| s.to_string()).collect();
    let filtered = store.query(&q).expect("query");
    assert_eq!(filtered.hits.len(), 1);
    assert_eq!(filtered.hits[0].doc_id, "m1");
    assert!((filtered.hits[0].score - m1_score).abs() < 1e-5);

    q.tags_filter = ["western"].iter().map(|s| s.to_string()).collect();
    assert!(store.query(&q).expect("query").hits.is_empty());
}

#[test]
fn expanded_text_is_searchable() {
    let tmp = TempDir::new().unwrap();
    let store = built_store(&tmp);
    let resp = store.query(&weighted("love", 10)).expect("query");
    assert_eq!(resp.hits.len(), 1);
    assert_eq!(resp.hits[0].doc_id, "m3");
}

#[test]
fn size_bounds_the_hit_list_but_not_total() {
    let tmp = TempDir::new().unwrap();
    let store = built_store(&tmp);
    let resp = store.query(&weighted("happy", 1)).expect("query");
    assert_eq!(resp.hits.len(), 1);
    assert_eq!(resp.total_hits, 2);
}

#[test]
fn stopword_only_query_returns_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = built_store(&tmp);
    let resp = store.query(&weighted("the and of", 10)).expect("query");
    assert!(resp.hits.is_empty());
    assert_eq!(resp.total_hits, 0);
}

#[test]
fn upsert_replaces_by_doc_id() {
    let tmp = TempDir::new().unwrap();
    let mut store = built_store(&tmp);
    let outcome = store
        .bulk_upsert(&[doc("m2", "Happy Feet Two", "Penguins return.", &["animation"], None)])
        .expect("upsert");
    assert_eq!(outcome.indexed, 1);
    assert_eq!(store.num_docs(), 3);

    let resp = store.query(&weighted("return", 10)).expect("query");
    assert_eq!(resp.hits.len(), 1);
    assert_eq!(resp.hits[0].title, "Happy Feet Two");
}

#[test]
fn blank_doc_id_is_reported_not_written() {
    let tmp = TempDir::new().unwrap();
    let mut store = built_store(&tmp);
    let outcome = store.bulk_upsert(&[doc("  ", "Untitled", "nothing", &[], None)]).expect("bulk");
    assert_eq!(outcome.indexed, 0);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(store.num_docs(), 3);
}

#[test]
fn create_index_keeps_or_rebuilds() {
    let tmp = TempDir::new().unwrap();
    let mut store = built_store(&tmp);

    store.create_index(false).expect("reopen");
    assert_eq!(store.num_docs(), 3);

    store.create_index(true).expect("rebuild");
    assert_eq!(store.num_docs(), 0);
    assert!(TantivyStore::exists(store.dir()));
}

#[test]
fn open_reports_missing_index_as_fatal() {
    let tmp = TempDir::new().unwrap();
    let err = TantivyStore::open(tmp.path().join("nope")).err().expect("missing index");
    assert!(matches!(err, Error::IndexUnavailable(_)));
    assert!(err.is_fatal());

    let _ = built_store(&tmp);
    let reopened = TantivyStore::open(tmp.path().join("index")).expect("open");
    assert_eq!(reopened.num_docs(), 3);
}

#[test]
fn unopened_store_fails_queries() {
    let tmp = TempDir::new().unwrap();
    let store = TantivyStore::at(tmp.path().join("index"));
    assert!(store.query(&weighted("happy", 10)).is_err());
}
