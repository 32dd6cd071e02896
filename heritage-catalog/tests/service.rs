use std::sync::Arc;
use std::time::Duration;

use heritage_catalog::cache::{MemoryCache, NullCache, RedisCache};
use heritage_catalog::config::Config;
use heritage_catalog::filters::SearchFilters;
use heritage_catalog::pagination::PageRequest;
use heritage_catalog::{build_cache, build_service};
use heritage_store_db::NewArtifact;
use heritage_utils_test::{ScratchDir, sample_fixture};
use rstest::rstest;


use catalog::{
    CorruptCache, DiskCatalog, FailingCache, RecordingCache, cached_service, ids, service_with,
    uncached_service,
};

fn search(pairs: &[(&str, &str)]) -> SearchFilters {
    SearchFilters::from_pairs(pairs.iter().copied())
}

#[test]
fn test_name_search() {
    let service = uncached_service();
    let page = service
        .search(&search(&[("name", "venus")]), PageRequest::default())
        .unwrap();
    assert_eq!(ids(&page), vec![1, 2]);
    assert_eq!(page.total, 2);
    assert_eq!(page.pages, 1);
    assert_eq!(page.items[0].name, "Venus Rising");
    assert_eq!(page.items[1].name, "Venus Descending");
}

#[test]
fn test_unparseable_id_is_empty_not_an_error() {
    let service = uncached_service();
    let page = service
        .search(&search(&[("id", "abc")]), PageRequest::default())
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.pages, 1);
}

#[test]
fn test_tag_match_returns_artifact_once() {
    let service = uncached_service();
    let page = service
        .search(&search(&[("tag", "gold")]), PageRequest::default())
        .unwrap();
    assert_eq!(ids(&page), vec![1, 4]);
    assert_eq!(page.total, 2);
}

#[test]
fn test_creator_fan_out_is_deduplicated() {
    // Both creators of the chalice contain "cellini".
    let service = uncached_service();
    let page = service
        .search(&search(&[("creator", "cellini")]), PageRequest::default())
        .unwrap();
    assert_eq!(ids(&page), vec![4]);
    assert_eq!(page.total, 1);
}

#[rstest]
#[case(&[("q", "gold")], &[1, 4])]
#[case(&[("q", "statuette")], &[3])]
#[case(&[("q", "louvre")], &[3])]
#[case(&[("q", "canova")], &[2])]
#[case(&[("format", "painting"), ("tag", "gold")], &[1])]
#[case(&[("tag", "gold"), ("format", "painting")], &[1])]
#[case(&[("material", "marble"), ("name", "venus")], &[2])]
#[case(&[("location", "uffizi"), ("creator", "canova")], &[])]
#[case(&[("id", "3")], &[3])]
#[case(&[("id", " 4 "), ("tag", "gilded")], &[4])]
#[case(&[("name", "   ")], &[1, 2, 3, 4])]
#[case(&[], &[1, 2, 3, 4])]
fn test_search_cases(#[case] pairs: &[(&str, &str)], #[case] expected: &[i64]) {
    let service = uncached_service();
    let page = service.search(&search(pairs), PageRequest::default()).unwrap();
    assert_eq!(ids(&page), expected);
    assert_eq!(page.total, expected.len() as u64);
}

#[test]
fn test_pages_of_a_search() {
    let service = uncached_service();
    let filters = search(&[("name", "venus")]);

    let second = service.search(&filters, PageRequest::new(2, 1)).unwrap();
    assert_eq!(ids(&second), vec![2]);
    assert_eq!(second.pages, 2);

    let past_end = service.search(&filters, PageRequest::new(5, 1)).unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 2);
    assert_eq!(past_end.pages, 2);
}

#[test]
fn test_list_all() {
    let service = uncached_service();
    let page = service.list_all(PageRequest::new(1, 3)).unwrap();
    assert_eq!(ids(&page), vec![1, 2, 3]);
    assert_eq!(page.total, 4);
    assert_eq!(page.pages, 2);
}

#[test]
fn test_list_by_name() {
    let service = uncached_service();
    let page = service.list_by_name("VENUS", PageRequest::default()).unwrap();
    assert_eq!(ids(&page), vec![1, 2]);

    let blank = service.list_by_name("  ", PageRequest::default()).unwrap();
    assert!(blank.items.is_empty());
    assert_eq!(blank.total, 0);
    assert_eq!(blank.pages, 1);
}

#[test]
fn test_get_by_id() {
    let service = uncached_service();
    assert_eq!(service.get_by_id(999).unwrap(), None);

    let venus = service.get_by_id(1).unwrap().unwrap();
    assert_eq!(venus.format.as_deref(), Some("Painting"));
    assert_eq!(venus.location.as_deref(), Some("Uffizi"));
    assert_eq!(venus.creators, vec!["Sandro Botticelli"]);
    assert_eq!(venus.materials, vec!["Tempera", "Canvas"]);
    assert_eq!(venus.tags, vec!["Gold", "Renaissance"]);
    assert_eq!(venus.images, vec!["https://img.example/venus-1.jpg"]);

    let mars = service.get_by_id(3).unwrap().unwrap();
    assert_eq!(mars.format, None);
    assert!(mars.creators.is_empty());
    assert!(mars.tags.is_empty());
}

#[test]
fn test_conservation_reports() {
    let service = uncached_service();
    let reports = service.conservation_reports(1).unwrap().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].conditions, "Stable");
    assert_eq!(reports[0].date.to_string(), "2019-06-01");

    assert_eq!(service.conservation_reports(2).unwrap(), Some(Vec::new()));
    assert_eq!(service.conservation_reports(999).unwrap(), None);
}

#[test]
fn test_cached_results_match_computed() {
    let cached = cached_service();
    let uncached = uncached_service();
    let filters = search(&[("q", "gold")]);

    let first = cached.search(&filters, PageRequest::default()).unwrap();
    let second = cached.search(&filters, PageRequest::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, uncached.search(&filters, PageRequest::default()).unwrap());
}

#[test]
fn test_reordered_filters_share_a_cache_entry() {
    let cache = Arc::new(RecordingCache::new());
    let service = service_with(cache.clone());

    let a = service
        .search(&search(&[("tag", "gold"), ("format", "painting")]), PageRequest::default())
        .unwrap();
    let b = service
        .search(&search(&[("format", "painting"), ("tag", "gold")]), PageRequest::default())
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(cache.hits(), 1);
    assert_eq!(
        cache.set_keys(),
        vec![r#"heritage:search:{"format":"painting","tag":"gold"}:p1:s10"#.to_string()]
    );
}

#[test]
fn test_missing_artifact_is_not_cached() {
    let cache = Arc::new(RecordingCache::new());
    let service = service_with(cache.clone());

    assert_eq!(service.get_by_id(999).unwrap(), None);
    assert!(cache.set_keys().is_empty());

    service.get_by_id(1).unwrap().unwrap();
    assert_eq!(cache.set_keys().len(), 1);
}

#[test]
fn test_failing_cache_degrades_to_store() {
    let service = service_with(Arc::new(FailingCache));
    let uncached = uncached_service();
    let filters = search(&[("name", "venus")]);

    assert_eq!(
        service.search(&filters, PageRequest::default()).unwrap(),
        uncached.search(&filters, PageRequest::default()).unwrap()
    );
    assert!(service.get_by_id(1).unwrap().is_some());
    assert_eq!(service.list_all(PageRequest::default()).unwrap().total, 4);
}

#[test]
fn test_undecodable_cache_entry_is_a_miss() {
    let service = service_with(Arc::new(CorruptCache));
    let page = service.list_by_name("venus", PageRequest::default()).unwrap();
    assert_eq!(ids(&page), vec![1, 2]);
    assert_eq!(service.get_by_id(2).unwrap().unwrap().name, "Venus Descending");
}

#[test]
fn test_cached_pages_are_stale_until_expiry() {
    let disk = DiskCatalog::new();
    let cached = disk.service(Arc::new(MemoryCache::new(100)), Duration::from_secs(100));
    let expiring = disk.service(Arc::new(MemoryCache::new(100)), Duration::ZERO);
    let filters = search(&[("name", "venus")]);

    assert_eq!(cached.search(&filters, PageRequest::default()).unwrap().total, 2);
    assert_eq!(expiring.search(&filters, PageRequest::default()).unwrap().total, 2);

    let mut writer = disk.open();
    writer
        .insert_artifact(&NewArtifact {
            name: "Venus Returning".to_string(),
            ..Default::default()
        })
        .unwrap();

    // Writes don't invalidate: the cached page is served until it expires.
    assert_eq!(cached.search(&filters, PageRequest::default()).unwrap().total, 2);
    let fresh = expiring.search(&filters, PageRequest::default()).unwrap();
    assert_eq!(fresh.total, 3);
    assert_eq!(ids(&fresh), vec![1, 2, 5]);
}

#[test]
fn test_unreachable_redis_degrades_to_store() {
    let redis = RedisCache::new("redis://127.0.0.1:1/").unwrap();
    let service = service_with(Arc::new(redis));
    let uncached = uncached_service();
    let filters = search(&[("tag", "gold")]);

    assert_eq!(
        service.search(&filters, PageRequest::default()).unwrap(),
        uncached.search(&filters, PageRequest::default()).unwrap()
    );
    assert_eq!(service.get_by_id(4).unwrap().unwrap().name, "Golden Chalice");
}

#[test]
fn test_oversized_ttl_keeps_caching() {
    let cache = Arc::new(RecordingCache::new());
    let disk = DiskCatalog::new();
    let service = disk.service(cache.clone(), Duration::from_secs(u64::MAX));
    let filters = search(&[("name", "venus")]);

    let first = service.search(&filters, PageRequest::default()).unwrap();
    let second = service.search(&filters, PageRequest::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(ids(&second), vec![1, 2]);
    assert_eq!(cache.hits(), 1);
}

#[test]
fn test_concurrent_searches_on_pooled_connections() {
    let disk = DiskCatalog::new();
    let service = disk.pooled_service(Arc::new(NullCache), 2);
    assert_eq!(service.reader_count(), 2);

    std::thread::scope(|scope| {
        let workers: Vec<_> = [("name", "venus"), ("tag", "gold")]
            .into_iter()
            .map(|pair| {
                let service = &service;
                scope.spawn(move || {
                    let filters = search(&[pair]);
                    (0..20)
                        .map(|_| ids(&service.search(&filters, PageRequest::default()).unwrap()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        assert!(results[0].iter().all(|found| found == &[1, 2]));
        assert!(results[1].iter().all(|found| found == &[1, 4]));
    });
}

#[test]
fn test_service_built_from_config() {
    let dir = ScratchDir::new().unwrap();
    let seed = dir
        .write_file("seed.json", &sample_fixture().to_string())
        .unwrap();
    let config = Config {
        database_path: dir.db_path(),
        read_connections: 3,
        seed_file: Some(seed),
        ..Config::default()
    };

    let service = build_service(&config, build_cache(&config).unwrap()).unwrap();
    assert_eq!(service.reader_count(), 3);
    assert_eq!(service.list_all(PageRequest::default()).unwrap().total, 4);
    assert_eq!(
        ids(&service.search(&search(&[("material", "gold")]), PageRequest::default()).unwrap()),
        vec![4]
    );
}

#[test]
fn test_invalid_cache_url_fails_startup() {
    let config = Config {
        cache_url: Some("not a url".to_string()),
        ..Config::default()
    };
    assert!(build_cache(&config).is_err());

    let disabled = Config {
        cache_enabled: false,
        ..config
    };
    assert!(build_cache(&disabled).is_ok());
}
