//! Integration tests for the provider registry
//!
//! The provider database is served by a local mock HTTP server and fetched
//! with the real client.
//!
//! Run with: cargo test --test integration_tests

use std::sync::Arc;

use oembed_providers_client::{ClientTimeouts, ProviderDatabaseClient};
use oembed_providers_core::{
    cache::{CacheBackend, CacheInvalidationService, MemoryCacheBackend, PROVIDERS_CACHE_KEY},
    repository::{FetchSettings, MergedProviderRepository, ProviderRepository, RepositoryConfig},
    service::{AllowedProviderFilter, CustomProviderService, SettingsService},
    storage::{
        CustomEndpoint, CustomProvider, MemorySettingsStore, Settings, SettingsStore, YamlCustomProviderStore,
    },
    time::ManualClock,
    Error,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAX_AGE: u64 = 604_800;

struct Registry {
    repository: Arc<MergedProviderRepository>,
    custom: CustomProviderService,
    settings: SettingsService,
    allowed: AllowedProviderFilter,
    settings_store: Arc<MemorySettingsStore>,
    cache: Arc<MemoryCacheBackend>,
    clock: Arc<ManualClock>,
    _dir: tempfile::TempDir,
}

fn registry(providers_url: &str, external_fetch: bool) -> Registry {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let cache = Arc::new(MemoryCacheBackend::new(100, clock.clone()));
    let store = Arc::new(YamlCustomProviderStore::new(dir.path().join("custom_providers")));
    let database = Arc::new(ProviderDatabaseClient::new(ClientTimeouts::default()).unwrap());

    let fetch = FetchSettings {
        providers_url: providers_url.to_string(),
        external_fetch,
    };
    let settings_store = Arc::new(MemorySettingsStore::new(Settings {
        oembed_providers_url: fetch.providers_url.clone(),
        external_fetch,
        allowed_providers: Vec::new(),
    }));
    let repository = Arc::new(MergedProviderRepository::new(
        store.clone(),
        database,
        cache.clone(),
        clock.clone(),
        RepositoryConfig {
            fetch,
            max_age_secs: MAX_AGE,
            ..RepositoryConfig::default()
        },
    ));

    let invalidation = CacheInvalidationService::new(cache.clone(), cache.clone(), "media_source_plugins");
    Registry {
        custom: CustomProviderService::new(store, invalidation.clone()),
        settings: SettingsService::new(settings_store.clone(), invalidation).with_repository(repository.clone()),
        allowed: AllowedProviderFilter::new(repository.clone(), settings_store.clone()),
        repository,
        settings_store,
        cache,
        clock,
        _dir: dir,
    }
}

fn entry(name: &str, url: &str) -> Value {
    json!({
        "provider_name": name,
        "provider_url": url,
        "endpoints": [{
            "schemes": [format!("{url}*")],
            "url": format!("{url}api/oembed.{{format}}"),
            "formats": ["json", "XML"]
        }]
    })
}

fn custom(id: &str, label: &str, url: &str) -> CustomProvider {
    CustomProvider::new(id, label, url).with_endpoint(
        CustomEndpoint::new(format!("{url}oembed"), [format!("{url}media/*")], ["json"]).with_discovery(true),
    )
}

async fn serve(body: Value, expected_requests: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/providers.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_requests)
        .mount(&server)
        .await;
    server
}

fn database_url(server: &MockServer) -> String {
    format!("{}/providers.json", server.uri())
}

fn names(providers: &oembed_providers_core::ProviderMap) -> Vec<&str> {
    providers.keys().map(String::as_str).collect()
}

#[tokio::test]
async fn test_custom_only_without_external_fetch() {
    let server = serve(json!([entry("Vimeo", "https://vimeo.com/")]), 0).await;
    let registry = registry(&database_url(&server), false);
    registry
        .custom
        .create(custom("acme", "Acme", "https://acme.example.com/"))
        .await
        .unwrap();

    let providers = registry.repository.get_all().await.unwrap();

    assert_eq!(names(&providers), ["Acme"]);
}

#[tokio::test]
async fn test_external_database_sorted_by_name() {
    let server = serve(
        json!([
            entry("YouTube", "https://www.youtube.com/"),
            entry("Vimeo", "https://vimeo.com/")
        ]),
        1,
    )
    .await;
    let registry = registry(&database_url(&server), true);

    let providers = registry.repository.get_all().await.unwrap();

    assert_eq!(names(&providers), ["Vimeo", "YouTube"]);
    let endpoint = &providers["Vimeo"].endpoints()[0];
    assert_eq!(endpoint.url(), "https://vimeo.com/api/oembed.{format}");
    assert_eq!(endpoint.formats().len(), 2);
}

#[tokio::test]
async fn test_custom_provider_wins_name_collision() {
    let server = serve(
        json!([
            entry("Acme", "https://acme.example.com/"),
            entry("Vimeo", "https://vimeo.com/")
        ]),
        1,
    )
    .await;
    let registry = registry(&database_url(&server), true);
    registry
        .custom
        .create(custom("acme", "Acme", "https://custom.acme.example.com/"))
        .await
        .unwrap();

    let providers = registry.repository.get_all().await.unwrap();

    assert_eq!(names(&providers), ["Acme", "Vimeo"]);
    let acme = registry.repository.get("Acme").await.unwrap();
    assert_eq!(acme.url(), "https://custom.acme.example.com/");
    assert!(acme.endpoints()[0].supports_discovery());
}

#[tokio::test]
async fn test_server_error_fails_without_caching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/providers.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let url = database_url(&server);
    let registry = registry(&url, true);

    let err = registry.repository.get_all().await.unwrap_err();

    assert!(matches!(err, Error::ProviderDatabase { url: ref failed, .. } if *failed == url));
    assert!(registry.cache.get(PROVIDERS_CACHE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_database_is_a_fetch_error() {
    let registry = registry("http://127.0.0.1:1/providers.json", true);
    registry
        .custom
        .create(custom("acme", "Acme", "https://acme.example.com/"))
        .await
        .unwrap();

    assert!(matches!(
        registry.repository.get_all().await,
        Err(Error::ProviderDatabase { .. })
    ));
}

#[tokio::test]
async fn test_invalid_database_document() {
    for body in [json!([]), json!({"provider_name": "Vimeo"})] {
        let server = serve(body, 1).await;
        let registry = registry(&database_url(&server), true);

        assert!(matches!(
            registry.repository.get_all().await,
            Err(Error::InvalidProviderDatabase { .. })
        ));
    }
}

#[tokio::test]
async fn test_allow_list_selects_active_providers() {
    let server = serve(
        json!([
            entry("YouTube", "https://www.youtube.com/"),
            entry("Vimeo", "https://vimeo.com/")
        ]),
        1,
    )
    .await;
    let registry = registry(&database_url(&server), true);
    registry.settings.save_allowed_providers(["Vimeo"]).await.unwrap();

    let active = registry.allowed.active().await.unwrap();

    assert_eq!(names(&active), ["Vimeo"]);
    assert_eq!(registry.allowed.options().await.unwrap(), ["Vimeo", "YouTube"]);
    assert_eq!(
        registry.settings_store.load().await.unwrap().allowed_providers,
        ["Vimeo"]
    );
}

#[tokio::test]
async fn test_repeated_reads_fetch_once() {
    let server = serve(json!([entry("Vimeo", "https://vimeo.com/")]), 1).await;
    let registry = registry(&database_url(&server), true);

    let first = registry.repository.get_all().await.unwrap();
    let second = registry.repository.get_all().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_expired_set_is_rebuilt() {
    let server = serve(json!([entry("Vimeo", "https://vimeo.com/")]), 2).await;
    let registry = registry(&database_url(&server), true);

    registry.repository.get_all().await.unwrap();
    registry.clock.advance(i64::try_from(MAX_AGE).unwrap());
    registry.repository.get_all().await.unwrap();
    registry.clock.advance(1);
    registry.repository.get_all().await.unwrap();
}

#[tokio::test]
async fn test_mutations_trigger_rebuild() {
    let server = serve(json!([entry("Vimeo", "https://vimeo.com/")]), 4).await;
    let registry = registry(&database_url(&server), true);
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Vimeo"]);

    registry
        .custom
        .create(custom("acme", "Acme", "https://acme.example.com/"))
        .await
        .unwrap();
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Acme", "Vimeo"]);

    let mut renamed = custom("acme", "Zeta", "https://acme.example.com/");
    renamed.endpoints[0].formats.insert("xml".to_string(), true);
    registry.custom.update(renamed).await.unwrap();
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Vimeo", "Zeta"]);

    registry.custom.delete("acme").await.unwrap();
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Vimeo"]);

    // Allow-list changes leave the provider set cached.
    registry.settings.save_allowed_providers(["Vimeo"]).await.unwrap();
    registry.repository.get_all().await.unwrap();
}

#[tokio::test]
async fn test_settings_changes_trigger_rebuild() {
    let server = serve(json!([entry("Vimeo", "https://vimeo.com/")]), 1).await;
    let mirror = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mirror.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry("YouTube", "https://www.youtube.com/")])))
        .expect(1)
        .mount(&mirror)
        .await;
    let registry = registry(&database_url(&server), true);
    registry
        .custom
        .create(custom("acme", "Acme", "https://acme.example.com/"))
        .await
        .unwrap();
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Acme", "Vimeo"]);

    registry
        .settings
        .save_providers_url(&format!("{}/mirror.json", mirror.uri()))
        .await
        .unwrap();
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Acme", "YouTube"]);

    registry.settings.set_external_fetch(false).await.unwrap();
    assert_eq!(names(&registry.repository.get_all().await.unwrap()), ["Acme"]);
}
