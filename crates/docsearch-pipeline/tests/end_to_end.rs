use docsearch_core::config::AppConfig;
use docsearch_core::types::{Document, Query};
use docsearch_models::ModelSet;
use docsearch_pipeline::{DocumentExpander, Hits, IndexBuilder, SearchPipeline};
use docsearch_text::TantivyStore;
use tempfile::TempDir;

fn corpus() -> Vec<Document> {
    let doc = |id: &str, title: &str, body: &str, tags: &[&str]| Document {
        doc_id: id.into(),
        title: title.into(),
        body: body.into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };
    vec![
        doc("m1", "The Notebook", "A romance with a happy ending between two young lovers separated by war.", &["romance", "drama"]),
        doc("m2", "Happy Feet", "A penguin who cannot sing learns to dance and wins a happy ending for his colony.", &["animation"]),
        doc("m3", "Alien", "A crew aboard a ship is hunted by a creature.", &["horror", "sci-fi"]),
        doc("m4", "Titanic", "A romance aboard a doomed ocean liner.", &["romance"]),
    ]
}

fn build(tmp: &TempDir, cfg: &AppConfig, models: &ModelSet) -> TantivyStore {
    let expander = DocumentExpander::new(models.expander.clone(), &cfg.expansion, cfg.models.seed);
    let mut builder = IndexBuilder::new(TantivyStore::at(tmp.path().join("index")), Some(expander));
    builder.create_index(false).expect("create");
    let report = builder.bulk_index(&corpus(), 3);
    assert_eq!(report.indexed, 4);
    assert_eq!(report.failed, 0);
    builder.into_sink()
}

#[test]
fn romance_query_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let cfg = AppConfig::default();
    let models = ModelSet::fake();
    let store = build(&tmp, &cfg, &models);
    let p = SearchPipeline::new(store, &models, &cfg);

    let plain = p.search("romance with happy ending", 10, &Default::default());
    assert!(!plain.is_empty() && plain.len() <= 10);
    assert_eq!(plain[0].score, 1.0);
    assert!(plain.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(plain.iter().all(|r| (0.0..=1.0).contains(&r.score)));

    let resp = p.search_with_rerank_and_summary(&Query::new("romance with happy ending").with_top_k(10).with_final_top_k(2));
    let Hits::Reranked(ranked) = &resp.results else { panic!("expected reranked hits") };
    assert!(ranked.len() <= 2);
    assert!(ranked.windows(2).all(|w| w[0].rerank_score >= w[1].rerank_score));
    let summary = resp.summary.expect("summary");
    assert!(summary.ends_with('.'), "{summary}");
    assert!(summary.starts_with(&ranked[0].result.title));
    assert!(resp.degraded.is_empty());
}

#[test]
fn tag_filter_is_a_strict_subset() {
    let tmp = TempDir::new().unwrap();
    let cfg = AppConfig::default();
    let models = ModelSet::fake();
    let p = SearchPipeline::new(build(&tmp, &cfg, &models), &models, &cfg);

    let filter = ["horror".to_string()].into_iter().collect();
    let results = p.search("a crew aboard a ship", 10, &filter);
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.tags.contains("horror")));
}

#[test]
fn rebuilt_index_is_reopened_for_serving() {
    let tmp = TempDir::new().unwrap();
    let cfg = AppConfig::default();
    let models = ModelSet::fake();
    drop(build(&tmp, &cfg, &models));

    let store = TantivyStore::open(tmp.path().join("index")).expect("open");
    assert_eq!(store.num_docs(), 4);
    let p = SearchPipeline::new(store, &models, &cfg);
    let hits = p.search("penguin", 5, &Default::default());
    assert_eq!(hits[0].doc_id, "m2");
}
