use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Router, body::Bytes, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use beacon_core::{Measurement, MeasurementKind};
use beacon_relay::{HttpReporter, ReportResponse, Reporter};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>,
}

async fn spawn_endpoint(status: StatusCode, reply: &'static str) -> (String, Captured) {
    let captured = Captured::default();

    let app = Router::new()
        .route(
            "/medicion",
            post(move |State(captured): State<Captured>, headers: HeaderMap, body: Bytes| async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let json = serde_json::from_slice(&body).unwrap();
                captured.requests.lock().unwrap().push((content_type, json));
                (status, reply)
            }),
        )
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/medicion"), captured)
}

#[tokio::test]
async fn posts_json_and_passes_the_answer_through() {
    let (endpoint, captured) = spawn_endpoint(StatusCode::CREATED, "guardado").await;
    let reporter = HttpReporter::new(endpoint, Duration::from_secs(5)).unwrap();

    let response = reporter
        .report(&Measurement {
            kind: MeasurementKind::Gas,
            counter: 3,
            value: 200,
        })
        .await
        .unwrap();

    assert_eq!(
        response,
        ReportResponse {
            status: 201,
            body: "guardado".into(),
        }
    );

    let requests = captured.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].0.as_deref(),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(
        requests[0].1,
        serde_json::json!({ "tipo": "gas", "valor": 200 })
    );
}

#[tokio::test]
async fn empty_body_and_error_status_are_not_failures() {
    let (endpoint, captured) = spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR, "").await;
    let reporter = HttpReporter::new(endpoint, Duration::from_secs(5)).unwrap();

    let response = reporter
        .report(&Measurement {
            kind: MeasurementKind::Unknown(13),
            counter: 1,
            value: -4,
        })
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(response.body, "");

    let requests = captured.requests.lock().unwrap().clone();
    assert_eq!(
        requests[0].1,
        serde_json::json!({ "tipo": 13, "valor": -4 })
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    // bind and drop to get a port nobody is listening on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reporter =
        HttpReporter::new(format!("http://{addr}/medicion"), Duration::from_secs(2)).unwrap();

    let result = reporter
        .report(&Measurement {
            kind: MeasurementKind::Temperature,
            counter: 2,
            value: -12,
        })
        .await;

    assert!(result.is_err());
}
