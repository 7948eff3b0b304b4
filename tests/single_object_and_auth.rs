//! spec.md §8 "Single-object fallback" scenario, plus header-carrying auth
//! handlers exercised end to end through [`Connector`].

mod utils;
use utils::start_mitm;

use http_body_util::Full;
use hyper::{Request, Response, StatusCode, body::Incoming};
use serde_json::json;
use siphon::config::{
    ApiKeyAuthConfig, AuthSpec, BasicAuthConfig, FieldMapping, PipelineConfig, ResponseMapping,
    RestSourceConfig, SourceConfig,
};
use siphon::connector::Connector;
use std::sync::{Arc, Mutex};

fn rest_config(addr: std::net::SocketAddr, auth: Option<AuthSpec>) -> PipelineConfig {
    PipelineConfig {
        name: "single-object".into(),
        source: SourceConfig::Rest(RestSourceConfig {
            endpoint: format!("http://{addr}/profile"),
            method: "GET".into(),
            headers: Default::default(),
            query_params: Default::default(),
            auth,
            response_mapping: ResponseMapping {
                root_path: None,
                fields: vec![
                    FieldMapping { name: "id".into(), path: "id".into(), default_value: None },
                    FieldMapping {
                        name: "name".into(),
                        path: "name".into(),
                        default_value: Some(json!("unknown")),
                    },
                ],
            },
        }),
        pagination: None,
        retry_config: None,
    }
}

#[tokio::test]
async fn single_object_response_yields_one_record() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start mitm");
    *handler.lock().expect("lock handler") = Box::new(move |_req: &Request<Incoming>| {
        let body = json!({"id": 42, "name": "Alice"}).to_string();
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Full::from(body))
            .expect("resp")
    });

    let connector = Connector::new(rest_config(addr, None)).expect("connector");
    let records = connector.extract_uncancellable().await.expect("extract");

    assert_eq!(records.len(), 1);
    let record = records.first().expect("one record");
    assert_eq!(record.get("id").and_then(|v| v.as_i64()), Some(42));
    assert_eq!(record.get("name").and_then(|v| v.as_str()), Some("Alice"));

    shutdown.shutdown().await;
}

#[tokio::test]
async fn basic_auth_header_is_base64_encoded() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start mitm");
    let captured = Arc::new(Mutex::new(None));
    let captured_clone = captured.clone();
    *handler.lock().expect("lock handler") = Box::new(move |req: &Request<Incoming>| {
        let auth = req
            .headers()
            .get(hyper::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        *captured_clone.lock().expect("store header") = auth;
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Full::from(json!({"id": 1, "name": "Bob"}).to_string()))
            .expect("resp")
    });

    let auth = Some(AuthSpec::Basic(BasicAuthConfig { username: "alice".into(), password: "hunter2".into() }));
    let connector = Connector::new(rest_config(addr, auth)).expect("connector");
    connector.extract_uncancellable().await.expect("extract");

    let header = captured.lock().expect("read header").clone();
    assert_eq!(header.as_deref(), Some("Basic YWxpY2U6aHVudGVyMg=="));

    shutdown.shutdown().await;
}

#[tokio::test]
async fn api_key_auth_is_carried_as_a_query_parameter() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start mitm");
    let captured = Arc::new(Mutex::new(None));
    let captured_clone = captured.clone();
    *handler.lock().expect("lock handler") = Box::new(move |req: &Request<Incoming>| {
        *captured_clone.lock().expect("store query") = req.uri().query().map(str::to_owned);
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(Full::from(json!({"id": 1, "name": "Bob"}).to_string()))
            .expect("resp")
    });

    let auth = Some(AuthSpec::ApiKey(ApiKeyAuthConfig {
        value: "secret-key".into(),
        header: None,
        query_param: Some("api_key".into()),
    }));
    let connector = Connector::new(rest_config(addr, auth)).expect("connector");
    connector.extract_uncancellable().await.expect("extract");

    let query = captured.lock().expect("read query").clone();
    assert_eq!(query.as_deref(), Some("api_key=secret-key"));

    shutdown.shutdown().await;
}
