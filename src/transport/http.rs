//! HTTP API
//!
//! Routes, nested under `/api/v1`:
//!
//! - `GET /ping`: liveness, answers `pong`
//! - `GET /state`: full state envelope
//! - `POST /scoreboard`: partial update, answers `ack` or `error`
//! - `OPTIONS /scoreboard`: CORS preflight
//! - `GET /events`: event stream, one `state` event per fan-out pass
//!
//! Every response carries the configured CORS headers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use futures_util::stream::{self, Stream};
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::protocol::{decode, encode_ack, encode_error, encode_state, ErrorCode, Inbound};
use crate::server::dispatch::{submit, Command};
use crate::state::StateStore;
use crate::stats::SyncStats;
use crate::transport::push::PushHub;

const ORIGIN: &str = "http";

/// Event name carried by every push-stream event
pub const STATE_EVENT: &str = "state";

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Shared handler state
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<StateStore>,
    pub inbound: mpsc::Sender<Command>,
    pub push: PushHub,
    pub stats: Arc<SyncStats>,
    cors_origin: HeaderValue,
}

impl HttpState {
    pub fn new(
        store: Arc<StateStore>,
        inbound: mpsc::Sender<Command>,
        push: PushHub,
        stats: Arc<SyncStats>,
        cors_origin: &str,
    ) -> Self {
        let cors_origin = HeaderValue::from_str(cors_origin).unwrap_or_else(|_| {
            tracing::warn!(origin = cors_origin, "Invalid CORS origin, using *");
            HeaderValue::from_static("*")
        });
        Self {
            store,
            inbound,
            push,
            stats,
            cors_origin,
        }
    }
}

/// Create the full router
pub fn create_router(state: HttpState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .layer(middleware::map_response_with_state(state.clone(), apply_cors))
        .with_state(state)
}

fn api_v1_routes() -> Router<HttpState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/state", get(state_handler))
        .route(
            "/scoreboard",
            post(scoreboard_handler).options(preflight_handler),
        )
        .route("/events", get(events_handler))
}

async fn apply_cors(State(state): State<HttpState>, mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, state.cors_origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

fn envelope(status: StatusCode, body: Bytes) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Handler for `GET /api/v1/ping`
async fn ping_handler() -> &'static str {
    "pong"
}

/// Handler for `GET /api/v1/state`
async fn state_handler(State(state): State<HttpState>) -> Response {
    envelope(StatusCode::OK, encode_state(&state.store.snapshot()))
}

/// Handler for `OPTIONS /api/v1/scoreboard`
async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Handler for `POST /api/v1/scoreboard`
async fn scoreboard_handler(State(state): State<HttpState>, body: Bytes) -> Response {
    // The body is complete, so an incomplete envelope is reported as-is
    let update = match decode(&body) {
        Ok(Inbound::StateUpdate(update)) => update,
        Ok(Inbound::Unrecognized(kind)) => {
            tracing::debug!(kind = %kind, "Ignoring HTTP message");
            return envelope(StatusCode::OK, encode_ack());
        }
        Err(e) => {
            state.stats.record_decode_error();
            tracing::warn!(error = %e, "Malformed HTTP update");
            return envelope(
                StatusCode::BAD_REQUEST,
                encode_error(ErrorCode::Parse, &e.to_string()),
            );
        }
    };

    match submit(&state.inbound, update, ORIGIN).await {
        Ok(Ok(_)) => envelope(StatusCode::OK, encode_ack()),
        Ok(Err(e)) => envelope(
            StatusCode::BAD_REQUEST,
            encode_error(ErrorCode::Validation, &e.to_string()),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Dispatcher unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

fn state_event(payload: &[u8]) -> Event {
    Event::default()
        .event(STATE_EVENT)
        .data(String::from_utf8_lossy(payload))
}

/// Handler for `GET /api/v1/events`
async fn events_handler(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sub = state.push.subscribe(&state.store);
    let initial = sub.initial.clone();

    let events = stream::unfold((Some(initial), sub), |(pending, mut sub)| async move {
        if let Some(payload) = pending {
            return Some((Ok(state_event(&payload)), (None, sub)));
        }
        loop {
            match sub.rx.recv().await {
                Ok(payload) => return Some((Ok(state_event(&payload)), (None, sub))),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Push-stream client lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::broadcast::{DirtySignal, StateFrame, StateSink};
    use crate::server::dispatch::Dispatcher;
    use crate::state::Team;

    fn create_test_state(cors_origin: &str) -> HttpState {
        let store = Arc::new(StateStore::new());
        let stats = Arc::new(SyncStats::new());
        let signal = DirtySignal::new(Arc::clone(&stats));
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(Dispatcher::new(Arc::clone(&store), signal, Arc::clone(&stats), rx).run());

        let push = PushHub::new(4, Arc::clone(&stats));
        HttpState::new(store, tx, push, stats, cors_origin)
    }

    fn post_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/scoreboard")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_router_ping() {
        let app = create_router(create_test_state("*"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"pong");
    }

    #[tokio::test]
    async fn test_get_state() {
        let state = create_test_state("*");
        state.store.mutate(|s| s.team_mut(Team::B).score = 4);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/state")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["type"], "state");
        assert_eq!(body["data"]["b"], 4);
        assert_eq!(body["data"]["bo"], 3);
    }

    #[tokio::test]
    async fn test_post_update_acks() {
        let state = create_test_state("*");
        let store = Arc::clone(&state.store);
        let app = create_router(state);

        let response = app
            .oneshot(post_request(r#"{"type":"state","data":{"a":7,"sv":"B"}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["type"], "ack");
        assert_eq!(body["data"]["ok"], true);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.team(Team::A).score, 7);
        assert_eq!(snapshot.serving, Team::B);
    }

    #[tokio::test]
    async fn test_post_malformed_is_parse_error() {
        let state = create_test_state("*");
        let stats = Arc::clone(&state.stats);
        let app = create_router(state);

        let response = app.oneshot(post_request("not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["type"], "error");
        assert_eq!(body["data"]["code"], "parse");
        assert_eq!(stats.snapshot().decode_errors, 1);
    }

    #[tokio::test]
    async fn test_post_truncated_is_incomplete() {
        let app = create_router(create_test_state("*"));

        let response = app
            .oneshot(post_request(r#"{"type":"state","data":{"a":1"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["data"]["code"], "parse");
        assert_eq!(body["data"]["msg"], "incomplete");
    }

    #[tokio::test]
    async fn test_post_invalid_serving_is_validation_error() {
        let state = create_test_state("*");
        let store = Arc::clone(&state.store);
        let app = create_router(state);

        let response = app
            .oneshot(post_request(r#"{"type":"state","data":{"sv":"C"}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["data"]["code"], "validation");
        assert_eq!(body["data"]["msg"], "sv must be 'A' or 'B'");
        assert_eq!(store.snapshot().serving, Team::A);
    }

    #[tokio::test]
    async fn test_post_unrecognized_type_acks() {
        let app = create_router(create_test_state("*"));

        let response = app
            .oneshot(post_request(r#"{"type":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["type"], "ack");
    }

    #[tokio::test]
    async fn test_preflight_and_cors_headers() {
        let app = create_router(create_test_state("http://controller.local"));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/scoreboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://controller.local"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    #[tokio::test]
    async fn test_events_stream_starts_with_current_state() {
        let state = create_test_state("*");
        state.store.mutate(|s| s.team_mut(Team::A).score = 11);
        let push = state.push.clone();
        let store = Arc::clone(&state.store);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

        let mut body = response.into_body();
        let first = body.frame().await.unwrap().unwrap().into_data().unwrap();
        let first = String::from_utf8(first.to_vec()).unwrap();
        assert!(first.contains("event: state"));
        assert!(first.contains(r#""a":11"#));

        store.mutate(|s| s.team_mut(Team::A).score = 12);
        push.deliver(&StateFrame::new(1, store.snapshot())).unwrap();

        let next = body.frame().await.unwrap().unwrap().into_data().unwrap();
        let next = String::from_utf8(next.to_vec()).unwrap();
        assert!(next.contains(r#""a":12"#));
    }
}
