//! spec.md §8 property 3 / "Link pagination with relative next" scenario.

mod utils;
use utils::start_mitm;

use http_body_util::Full;
use hyper::{Request, Response, StatusCode, body::Incoming};
use serde_json::json;
use siphon::config::{
    FieldMapping, PaginationSpec, PipelineConfig, ResponseMapping, RestSourceConfig, SourceConfig,
};
use siphon::connector::Connector;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn follows_relative_link_header_until_absent() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start mitm");
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    *handler.lock().expect("lock handler") = Box::new(move |req: &Request<Incoming>| {
        let call = calls_clone.fetch_add(1, Ordering::SeqCst);
        let is_first = req.uri().query().is_none();
        let (body, link) = if is_first {
            (json!({"items": [{"id": 1}]}).to_string(), Some(r#"</api/data?page=2>; rel="next""#))
        } else {
            assert_eq!(req.uri().query(), Some("page=2"));
            (json!({"items": [{"id": 2}]}).to_string(), None)
        };
        assert!(call < 2, "pager issued more requests than the server provides next links for");
        let mut builder = Response::builder().status(StatusCode::OK).header("Content-Type", "application/json");
        if let Some(link) = link {
            builder = builder.header("Link", link);
        }
        builder.body(Full::from(body)).expect("build response")
    });

    let config = PipelineConfig {
        name: "link-pagination".into(),
        source: SourceConfig::Rest(RestSourceConfig {
            endpoint: format!("http://{addr}/api/data"),
            method: "GET".into(),
            headers: Default::default(),
            query_params: Default::default(),
            auth: None,
            response_mapping: ResponseMapping {
                root_path: None,
                fields: vec![FieldMapping { name: "id".into(), path: "id".into(), default_value: None }],
            },
        }),
        pagination: Some(PaginationSpec::Link),
        retry_config: None,
    };

    let connector = Connector::new(config).expect("connector");
    let records = connector.extract_uncancellable().await.expect("extract");

    assert_eq!(records.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    shutdown.shutdown().await;
}
