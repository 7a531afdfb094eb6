//! End-to-end engine behavior against a scripted HTTP transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use locus_address::{
    describe_outcome, AddressEngine, AddressError, ConfirmationCode, Credential, CredentialCache,
    EngineConfig, GeocodingGateway, HealthConfig, HealthTracker, HttpRequest, HttpResponse,
    HttpTransport, PostalSettings, PostalValidationClient, ProviderKind, Severity,
    ValidationRequest,
};

const NOMINATIM_SEARCH: &str = "nominatim.test/search";
const NOMINATIM_REVERSE: &str = "nominatim.test/reverse";
const LOCATIONIQ_AUTOCOMPLETE: &str = "liq.test/v1/autocomplete";
const USPS_TOKEN: &str = "usps.test/oauth2/v3/token";
const USPS_ADDRESS: &str = "usps.test/addresses/v3/address";

#[derive(Clone)]
enum Reply {
    Json(u16, String),
    Unreachable,
}

/// Routes requests by URL fragment and records every request it sees.
struct ScriptedTransport {
    routes: Mutex<Vec<(&'static str, Reply)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        let transport = Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        });
        transport.route(
            USPS_TOKEN,
            Reply::Json(
                200,
                r#"{"access_token":"issued-token","token_type":"Bearer","expires_in":28800}"#
                    .to_string(),
            ),
        );
        transport
    }

    fn route(&self, fragment: &'static str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|(existing, _)| *existing != fragment);
        routes.push((fragment, reply));
    }

    fn calls_to(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }

    fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request_to(&self, fragment: &str) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.url.contains(fragment))
            .cloned()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, AddressError> {
        let reply = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment))
            .map(|(_, reply)| reply.clone());
        let provider = request.provider;
        self.requests.lock().unwrap().push(request);

        match reply {
            Some(Reply::Json(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Reply::Unreachable) | None => Err(AddressError::Transport {
                provider: provider.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn config() -> EngineConfig {
    EngineConfig::default()
        .with_nominatim_url("https://nominatim.test")
        .with_locationiq("https://liq.test/v1", "test-key")
        .with_usps("https://usps.test", "client-id", "client-secret")
        .with_user_agent("locus-tests/1.0")
}

fn engine_with(transport: &Arc<ScriptedTransport>) -> AddressEngine {
    AddressEngine::with_transport(&config(), transport.clone())
}

fn usps_body(code: &str, footnotes: &str) -> String {
    format!(
        r#"{{
            "address": {{
                "streetAddress": "123 MAIN ST",
                "secondaryAddress": "",
                "city": "SPRINGFIELD",
                "state": "IL",
                "ZIPCode": "62704"
            }},
            "additionalInfo": {{
                "DPVConfirmation": "{}",
                "DPVFootnotes": "{}",
                "business": "N",
                "vacant": "N"
            }},
            "matches": [{{ "code": "31", "text": "Single Response - exact match" }}]
        }}"#,
        code, footnotes
    )
}

fn springfield() -> ValidationRequest {
    ValidationRequest::new("123 Main St", "Springfield", "IL", "62704")
}

const LOCATIONIQ_RESULTS: &str = r#"[
    {
        "place_id": "331234",
        "lat": "39.0419",
        "lon": "-94.5919",
        "display_name": "4500 Main Street, Kansas City, Missouri, 64111, USA",
        "type": "house",
        "address": {
            "house_number": "4500",
            "road": "Main Street",
            "city": "Kansas City",
            "state": "Missouri",
            "postcode": "64111",
            "country_code": "us"
        }
    }
]"#;

#[tokio::test]
async fn short_queries_never_reach_a_backend() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);

    for query in ["", "a", "ab", "  ab  ", "\t4\n"] {
        let results = engine.search_addresses(query, 5).await.unwrap();
        assert!(results.is_empty(), "{:?} should return nothing", query);
    }

    assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn confirmation_codes_classify_results() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);

    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("Y", "")));
    let confirmed = engine.validate_address(&springfield()).await.unwrap();
    assert!(confirmed.is_valid);
    assert!(!confirmed.needs_secondary_address);
    assert!(!confirmed.secondary_address_invalid);
    assert_eq!(describe_outcome(&confirmed).severity, Severity::Success);

    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("D", "AAN1")));
    let missing_unit = engine.validate_address(&springfield()).await.unwrap();
    assert!(missing_unit.needs_secondary_address);
    assert_eq!(describe_outcome(&missing_unit).severity, Severity::Warning);

    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("S", "CC")));
    let bad_unit = engine.validate_address(&springfield()).await.unwrap();
    assert!(bad_unit.secondary_address_invalid);

    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("N", "M1")));
    let not_found = engine.validate_address(&springfield()).await.unwrap();
    assert_eq!(not_found.confirmation_code, ConfirmationCode::NotFound);
    assert!(!not_found.is_valid);
    assert!(!not_found.needs_secondary_address);
    assert!(!not_found.secondary_address_invalid);
    assert!(!not_found.error.unwrap_or_default().is_empty());

    assert_eq!(transport.calls_to(USPS_TOKEN), 1);
}

#[tokio::test]
async fn not_found_status_is_a_classified_result() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(
        USPS_ADDRESS,
        Reply::Json(404, r#"{"error":{"message":"Address Not Found."}}"#.to_string()),
    );

    let result = engine.validate_address(&springfield()).await.unwrap();

    assert!(!result.is_valid);
    assert!(!result.needs_secondary_address);
    assert!(!result.secondary_address_invalid);
    assert!(!result.error.clone().unwrap_or_default().is_empty());
    assert_eq!(describe_outcome(&result).severity, Severity::Error);
}

#[tokio::test]
async fn unreachable_validation_backend_is_not_an_error() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(USPS_ADDRESS, Reply::Unreachable);

    let result = engine.validate_address(&springfield()).await.unwrap();

    assert!(result.error.is_some());
    assert!(!result.is_valid);
}

#[tokio::test]
async fn primary_failure_falls_over_to_secondary() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(NOMINATIM_SEARCH, Reply::Unreachable);
    transport.route(
        LOCATIONIQ_AUTOCOMPLETE,
        Reply::Json(200, LOCATIONIQ_RESULTS.to_string()),
    );

    let results = engine.search_addresses("4500 Main", 5).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].provider, ProviderKind::Secondary);
    assert_eq!(results[0].city, "Kansas City");
    assert_eq!(engine.health().failure_count(ProviderKind::Primary), 1);
    assert_eq!(engine.health().failure_count(ProviderKind::Secondary), 0);
}

#[tokio::test]
async fn repeated_primary_failures_reorder_backends() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(NOMINATIM_SEARCH, Reply::Json(503, String::new()));
    transport.route(
        LOCATIONIQ_AUTOCOMPLETE,
        Reply::Json(200, LOCATIONIQ_RESULTS.to_string()),
    );

    for _ in 0..3 {
        let results = engine.search_addresses("4500 Main", 5).await.unwrap();
        assert_eq!(results.len(), 1);
    }
    assert_eq!(
        engine.health().order(),
        vec![ProviderKind::Secondary, ProviderKind::Primary]
    );

    engine.search_addresses("4500 Main", 5).await.unwrap();
    assert_eq!(transport.calls_to(NOMINATIM_SEARCH), 3);
    assert_eq!(transport.calls_to(LOCATIONIQ_AUTOCOMPLETE), 4);

    let health = engine.provider_health();
    assert!(!health[0].healthy);
    assert!(health[1].healthy);
}

#[test]
fn failure_window_expiry_restores_primary() {
    let tracker = HealthTracker::new(
        HealthConfig {
            failure_threshold: 3,
            reset_interval: Duration::from_millis(100),
        },
        true,
    );

    for _ in 0..3 {
        tracker.record_failure(ProviderKind::Primary);
    }
    assert_eq!(tracker.order()[0], ProviderKind::Secondary);

    std::thread::sleep(Duration::from_millis(150));

    assert_eq!(tracker.failure_count(ProviderKind::Primary), 0);
    assert_eq!(tracker.order()[0], ProviderKind::Primary);
}

fn engine_with_cache(
    transport: &Arc<ScriptedTransport>,
    cache: Arc<CredentialCache>,
) -> AddressEngine {
    let postal = PostalValidationClient::new(
        transport.clone(),
        PostalSettings::new("https://usps.test", "locus-tests/1.0")
            .with_credentials("client-id", "client-secret"),
        cache,
    );
    let health = Arc::new(HealthTracker::with_defaults(false));
    AddressEngine::with_parts(GeocodingGateway::new(Vec::new(), health), postal)
}

#[tokio::test]
async fn fresh_credential_is_reused_verbatim() {
    let transport = ScriptedTransport::new();
    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("Y", "")));
    let cache = Arc::new(CredentialCache::new());
    cache
        .store(Credential::new(
            "cached-token",
            Utc::now() + chrono::Duration::minutes(30),
        ))
        .await;
    let engine = engine_with_cache(&transport, cache);

    engine.validate_address(&springfield()).await.unwrap();
    engine.validate_address(&springfield()).await.unwrap();

    assert_eq!(transport.calls_to(USPS_TOKEN), 0);
    let request = transport.last_request_to(USPS_ADDRESS).unwrap();
    assert_eq!(request.header("authorization"), Some("Bearer cached-token"));
}

#[tokio::test]
async fn expiring_credential_is_refreshed_once() {
    let transport = ScriptedTransport::new();
    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("Y", "")));
    let cache = Arc::new(CredentialCache::new());
    cache
        .store(Credential::new(
            "stale-token",
            Utc::now() + chrono::Duration::minutes(4),
        ))
        .await;
    let engine = engine_with_cache(&transport, cache.clone());

    engine.validate_address(&springfield()).await.unwrap();
    engine.validate_address(&springfield()).await.unwrap();

    assert_eq!(transport.calls_to(USPS_TOKEN), 1);
    assert_eq!(cache.current().await.unwrap().token(), "issued-token");
    let request = transport.last_request_to(USPS_ADDRESS).unwrap();
    assert_eq!(request.header("authorization"), Some("Bearer issued-token"));
}

#[tokio::test]
async fn credential_exchange_failure_propagates() {
    let transport = ScriptedTransport::new();
    transport.route(
        USPS_TOKEN,
        Reply::Json(401, r#"{"error":{"message":"invalid client"}}"#.to_string()),
    );
    let engine = engine_with(&transport);

    let result = engine.validate_address(&springfield()).await;

    assert!(matches!(
        result,
        Err(AddressError::CredentialExchange { .. })
    ));
    assert_eq!(transport.calls_to(USPS_ADDRESS), 0);
}

#[tokio::test]
async fn springfield_standardizes_to_its_zip() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(USPS_ADDRESS, Reply::Json(200, usps_body("Y", "")));

    let result = engine.validate_address(&springfield()).await.unwrap();
    let standardized = result.standardized_address.unwrap();

    assert!(!standardized.street_address.is_empty());
    assert!(!standardized.city.is_empty());
    assert!(!standardized.state.is_empty());
    assert_eq!(standardized.zip_code, "62704");
    assert_eq!(standardized.full_zip(), "62704");

    let request = transport.last_request_to(USPS_ADDRESS).unwrap();
    assert_eq!(request.query_param("streetAddress"), Some("123 Main St"));
    assert_eq!(request.query_param("ZIPCode"), Some("62704"));
}

#[tokio::test]
async fn kansas_city_reverse_geocode() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(
        NOMINATIM_REVERSE,
        Reply::Json(
            200,
            r#"{
                "place_id": 282830181,
                "lat": "39.0997",
                "lon": "-94.5786",
                "display_name": "Kansas City, Jackson County, Missouri, United States",
                "category": "boundary",
                "type": "administrative",
                "addresstype": "city",
                "address": {
                    "city": "Kansas City",
                    "county": "Jackson County",
                    "state": "Missouri",
                    "country": "United States",
                    "country_code": "us"
                }
            }"#
            .to_string(),
        ),
    );

    let suggestion = engine
        .reverse_geocode(39.0997, -94.5786)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(suggestion.city, "Kansas City");
    assert_eq!(suggestion.state, "Missouri");
    assert!((suggestion.latitude - 39.0997).abs() < 1e-9);
    assert!((suggestion.longitude + 94.5786).abs() < 1e-9);
    assert_eq!(suggestion.provider, ProviderKind::Primary);

    let request = transport.last_request_to(NOMINATIM_REVERSE).unwrap();
    assert_eq!(request.header("user-agent"), Some("locus-tests/1.0"));
}

#[tokio::test]
async fn zip_lookup_returns_city_and_state() {
    let transport = ScriptedTransport::new();
    let engine = engine_with(&transport);
    transport.route(
        "usps.test/addresses/v3/city-state",
        Reply::Json(
            200,
            r#"{"city":"SPRINGFIELD","state":"IL","ZIPCode":"62704"}"#.to_string(),
        ),
    );

    let found = engine.lookup_zip_code("62704").await.unwrap().unwrap();
    assert_eq!(found.city, "SPRINGFIELD");
    assert_eq!(found.state, "IL");

    assert!(engine.lookup_zip_code("6270").await.unwrap().is_none());
    assert_eq!(transport.calls_to("city-state"), 1);
}
