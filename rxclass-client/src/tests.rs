use crate::cache::{CacheConfig, ClassificationCache};
use crate::rxclass::{
    ClassConcept, MinConcept, RxClassDrugInfo, RxClassDrugInfoList, RxClassResponse,
};
use crate::{
    ClassEntry, ClassSource, Classification, ClassificationResolver, ClassificationSource,
    DeduplicationConfig, Error, ErrorKind,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

enum Script {
    Classes(&'static str, Vec<(&'static str, &'static str, &'static str)>),
    Fail(ErrorKind),
    Hang,
}

/// In-memory stand-in for RxNav
#[derive(Default)]
struct ScriptedSource {
    scripts: HashMap<&'static str, Script>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn with(mut self, rxcui: &'static str, script: Script) -> Self {
        self.scripts.insert(rxcui, script);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn response(drug_name: &str, classes: &[(&str, &str, &str)]) -> RxClassResponse {
    let rxclass_drug_info = classes
        .iter()
        .map(|(class_type, class_id, class_name)| RxClassDrugInfo {
            min_concept: Some(MinConcept {
                rxcui: None,
                name: Some(drug_name.to_string()),
                tty: Some("IN".to_string()),
            }),
            rxclass_min_concept_item: Some(ClassConcept {
                class_id: Some(class_id.to_string()),
                class_name: Some(class_name.to_string()),
                class_type: Some(class_type.to_string()),
            }),
            rela: None,
            rela_source: None,
        })
        .collect();

    RxClassResponse {
        rxclass_drug_info_list: Some(RxClassDrugInfoList { rxclass_drug_info }),
    }
}

#[async_trait]
impl ClassificationSource for ScriptedSource {
    async fn fetch(&self, rxcui: &str) -> Result<RxClassResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Yield so concurrent lookups actually interleave
        tokio::time::sleep(StdDuration::from_millis(10)).await;

        match self.scripts.get(rxcui) {
            Some(Script::Classes(name, classes)) => Ok(response(name, classes)),
            Some(Script::Fail(kind)) => Err(Error::new(*kind, rxcui, "scripted failure")),
            Some(Script::Hang) => {
                tokio::time::sleep(StdDuration::from_secs(5)).await;
                Ok(RxClassResponse::default())
            }
            None => Err(Error::status(rxcui, 404)),
        }
    }
}

fn metoprolol() -> Script {
    Script::Classes(
        "metoprolol",
        vec![
            ("ATC1-4", "C07AB", "Beta blocking agents, selective"),
            ("VA", "CV100", "Beta Blockers/Related"),
            ("EPC", "N0000175556", "beta-Adrenergic Blocker"),
        ],
    )
}

fn atenolol() -> Script {
    Script::Classes(
        "atenolol",
        vec![
            ("ATC1-4", "C07AB", "Beta blocking agents, selective"),
            ("MOA", "N0000000161", "Adrenergic beta1-Antagonists"),
        ],
    )
}

fn resolver(source: Arc<ScriptedSource>) -> ClassificationResolver {
    ClassificationResolver::with_source(
        source,
        Arc::new(ClassificationCache::default()),
        StdDuration::from_millis(200),
    )
}

fn codes(rxcuis: &[&str]) -> Vec<String> {
    rxcuis.iter().map(|rxcui| rxcui.to_string()).collect()
}

#[tokio::test]
async fn test_resolve_keeps_input_order_and_filters_sources() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("6918", metoprolol())
            .with("1202", atenolol()),
    );
    let resolver = resolver(source.clone());

    let results = resolver.resolve_many(&codes(&["1202", "6918"])).await.unwrap();
    assert_eq!(results.len(), 2);

    let atenolol = results[0].as_ref().unwrap();
    assert_eq!(atenolol.rxcui(), "1202");
    assert_eq!(atenolol.drug_name().as_deref(), Some("atenolol"));

    let metoprolol = results[1].as_ref().unwrap();
    let names: Vec<_> = metoprolol.therapeutic_class_names().collect();
    assert_eq!(names, vec!["Beta blocking agents, selective", "Beta Blockers/Related"]);
    assert!(metoprolol
        .classes()
        .iter()
        .all(|entry| *entry.source() != ClassSource::Other));

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_empty_input() {
    let source = Arc::new(ScriptedSource::default());
    let results = resolver(source.clone()).resolve_many(&[]).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_second_resolution_is_served_from_cache() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("6918", metoprolol())
            .with("1202", atenolol()),
    );
    let resolver = resolver(source.clone());
    let rxcuis = codes(&["6918", "1202"]);

    let first = resolver.resolve_many(&rxcuis).await.unwrap();
    let second = resolver.resolve_many(&rxcuis).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(), 2);
    assert_eq!(resolver.cache_stats().valid_entries, 2);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let source = Arc::new(ScriptedSource::default().with("6918", metoprolol()));
    let cache = Arc::new(ClassificationCache::new(CacheConfig::default()));
    let stale = Classification::new(
        "6918".to_string(),
        Some("metoprolol".to_string()),
        vec![ClassEntry::new(ClassSource::Va, None, "Outdated".to_string(), None)],
        Utc::now() - Duration::hours(24),
    );
    cache.put("6918", stale);

    let resolver = ClassificationResolver::with_source(
        source.clone(),
        cache.clone(),
        StdDuration::from_millis(200),
    );
    let results = resolver.resolve_many(&codes(&["6918"])).await.unwrap();

    assert_eq!(source.calls(), 1);
    let fresh = results[0].as_ref().unwrap();
    assert!(fresh.therapeutic_class_names().all(|name| name != "Outdated"));
    assert_eq!(cache.get("6918").as_ref(), Some(fresh));
}

#[tokio::test]
async fn test_entry_just_inside_ttl_is_a_hit() {
    let source = Arc::new(ScriptedSource::default().with("6918", metoprolol()));
    let cache = Arc::new(ClassificationCache::default());
    let cached = Classification::new(
        "6918".to_string(),
        None,
        vec![],
        Utc::now() - Duration::hours(23) - Duration::minutes(59),
    );
    cache.put("6918", cached.clone());

    let resolver = ClassificationResolver::with_source(
        source.clone(),
        cache,
        StdDuration::from_millis(200),
    );
    let results = resolver.resolve_many(&codes(&["6918"])).await.unwrap();

    assert_eq!(source.calls(), 0);
    assert_eq!(results, vec![Some(cached)]);
}

#[tokio::test]
async fn test_timeout_only_affects_its_own_position() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("6918", metoprolol())
            .with("999", Script::Hang)
            .with("1202", atenolol()),
    );
    let resolver = resolver(source.clone());

    let results = resolver.resolve_many(&codes(&["6918", "999", "1202"])).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_some());
    assert!(results[1].is_none());
    assert!(results[2].is_some());
    assert!(resolver.cache().get("999").is_none());
}

#[tokio::test]
async fn test_total_failure_is_not_an_error() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("1", Script::Fail(ErrorKind::Transport))
            .with("2", Script::Fail(ErrorKind::Malformed)),
    );
    let results = resolver(source.clone())
        .resolve_many(&codes(&["1", "2", "unknown", ""]))
        .await
        .unwrap();

    assert_eq!(results, vec![None, None, None, None]);
    assert_eq!(source.calls(), 4);
}

#[tokio::test]
async fn test_dispatch_failure_fails_the_batch() {
    let source = Arc::new(
        ScriptedSource::default()
            .with("6918", metoprolol())
            .with("bad", Script::Fail(ErrorKind::Dispatch)),
    );
    let resolver = resolver(source);

    let err = resolver.resolve_many(&codes(&["6918", "bad"])).await.unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::Dispatch);
    assert_eq!(err.rxcui(), "bad");
}

#[tokio::test]
async fn test_repeated_codes_are_fetched_per_occurrence() {
    let source = Arc::new(ScriptedSource::default().with("6918", metoprolol()));
    let results = resolver(source.clone())
        .resolve_many(&codes(&["6918", "6918"]))
        .await
        .unwrap();

    assert!(results.iter().all(Option::is_some));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_repeated_codes_share_one_fetch_with_deduplication() {
    let source = Arc::new(ScriptedSource::default().with("6918", metoprolol()));
    let resolver = resolver(source.clone()).with_deduplication(DeduplicationConfig::enabled());

    let results = resolver
        .resolve_many(&codes(&["6918", "6918", "6918"]))
        .await
        .unwrap();

    assert!(results.iter().all(Option::is_some));
    assert_eq!(source.calls(), 1);
    assert_eq!(resolver.deduplication_stats().unwrap().pending_requests, 0);
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let source = Arc::new(ScriptedSource::default().with("6918", metoprolol()));
    let cache = Arc::new(ClassificationCache::new(CacheConfig {
        ttl: Duration::hours(24),
        enabled: false,
    }));
    let resolver = ClassificationResolver::with_source(
        source.clone(),
        cache,
        StdDuration::from_millis(200),
    );

    resolver.resolve_many(&codes(&["6918"])).await.unwrap();
    resolver.resolve_many(&codes(&["6918"])).await.unwrap();

    assert_eq!(source.calls(), 2);
}
