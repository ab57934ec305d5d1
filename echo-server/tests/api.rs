use axum::http::{self, Request, StatusCode};
use echo_server::{app, Echo};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_get_reports_method_path_and_query() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo/users/alice?page=2&sort=asc")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo/users/alice");
    assert_eq!(echo.query["page"], "2");
    assert_eq!(echo.query["sort"], "asc");
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn echo_post_reports_headers_and_body() {
    let resp = app()
        .oneshot(json_request("POST", "/echo", r#"{"title":"Buy milk"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.headers["content-type"], "application/json");
    assert_eq!(echo.body, r#"{"title":"Buy milk"}"#);
}

#[tokio::test]
async fn echo_ids_are_unique() {
    let first: Echo = body_json(
        app()
            .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    let second: Echo = body_json(
        app()
            .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    assert_ne!(first.id, second.id);
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/status/404")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(resp).await, "Not Found");
}

#[tokio::test]
async fn status_out_of_range_returns_400() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/status/42")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_non_numeric_returns_400() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/status/teapot")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- delay ---

#[tokio::test]
async fn delay_eventually_answers() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/delay/5")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "done");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/nope").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
