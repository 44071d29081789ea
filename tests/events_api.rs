use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderName, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rstest::rstest;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use contribution_events::config::Config;
use contribution_events::routes::create_routes;
use contribution_events::state::AppState;
use contribution_events::store::InMemoryEventStore;

const USER_HEADER: &str = "x-user-id";

fn app_with(store: InMemoryEventStore) -> Router {
    let config = Config {
        trusted_user_header: Some(HeaderName::from_static(USER_HEADER)),
        ..Config::default()
    };
    create_routes(AppState::new(config, Arc::new(store)))
}

fn app() -> Router {
    app_with(InMemoryEventStore::new())
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, user: &str, body: Value) -> String {
    let response = send(app, request("POST", "/events", Some(user), Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    assert_eq!(json["message"], "event created");
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn it_should_run_the_book_drive_scenario() {
    let app = app();
    let user = Uuid::new_v4().to_string();

    let id = create(
        &app,
        &user,
        json!({"title": "Book Drive", "target_amount": 100}),
    )
    .await;

    let listed = send(&app, request("GET", "/events", Some(&user), None)).await;
    assert_eq!(listed.status(), StatusCode::OK);
    let etag = listed.headers()[header::ETAG].to_str().unwrap().to_string();
    assert!(listed.headers().contains_key(header::LAST_MODIFIED));
    let events = json_body(listed).await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["id"], id.as_str());
    assert_eq!(events[0]["status"], "ACTIVE");

    let mut conditional = request("GET", "/events", Some(&user), None);
    conditional
        .headers_mut()
        .insert(header::IF_NONE_MATCH, etag.parse().unwrap());
    let not_modified = send(&app, conditional).await;
    assert_eq!(not_modified.status(), StatusCode::NOT_MODIFIED);
    let bytes = not_modified.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    let updated = send(
        &app,
        request(
            "PATCH",
            &format!("/events/{id}"),
            Some(&user),
            Some(json!({"location": "Library"})),
        ),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(
        json_body(updated).await,
        json!({"id": id, "message": "event updated"})
    );

    let fetched = send(&app, request("GET", &format!("/events/{id}"), Some(&user), None)).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_ne!(fetched.headers()[header::ETAG].to_str().unwrap(), etag);
    let event = json_body(fetched).await;
    assert_eq!(event["title"], "Book Drive");
    assert_eq!(event["location"], "Library");
    assert_eq!(event["target_amount"].as_f64(), Some(100.0));

    let deleted = send(
        &app,
        request("DELETE", &format!("/events/{id}"), Some(&user), None),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = send(&app, request("GET", &format!("/events/{id}"), Some(&user), None)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn it_should_hide_other_users_events() {
    let app = app();
    let owner = Uuid::new_v4().to_string();
    let stranger = Uuid::new_v4().to_string();
    let id = create(&app, &owner, json!({"title": "Book Drive"})).await;

    let foreign = send(
        &app,
        request("GET", &format!("/events/{id}"), Some(&stranger), None),
    )
    .await;
    let missing = send(
        &app,
        request(
            "GET",
            &format!("/events/{}", Uuid::new_v4()),
            Some(&stranger),
            None,
        ),
    )
    .await;

    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(foreign).await, json_body(missing).await);

    let listed = send(&app, request("GET", "/events", Some(&stranger), None)).await;
    assert_eq!(listed.status(), StatusCode::OK);
    assert!(!listed.headers().contains_key(header::ETAG));
    assert_eq!(json_body(listed).await, json!([]));
}

#[tokio::test]
async fn it_should_filter_by_title_substring() {
    let app = app();
    let user = Uuid::new_v4().to_string();
    create(&app, &user, json!({"title": "Book Drive"})).await;
    create(&app, &user, json!({"title": "Food Bank"})).await;

    let listed = send(&app, request("GET", "/events?q=book", Some(&user), None)).await;
    let events = json_body(listed).await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["title"], "Book Drive");

    let listed = send(&app, request("GET", "/events?q=.*", Some(&user), None)).await;
    assert_eq!(json_body(listed).await, json!([]));
}

#[tokio::test]
async fn it_should_reject_an_empty_update() {
    let app = app();
    let user = Uuid::new_v4().to_string();
    let id = create(&app, &user, json!({"title": "Book Drive"})).await;

    let before = send(&app, request("GET", &format!("/events/{id}"), Some(&user), None)).await;
    let etag = before.headers()[header::ETAG].clone();

    let response = send(
        &app,
        request(
            "PATCH",
            &format!("/events/{id}"),
            Some(&user),
            Some(json!({"title": "", "target_amount": 0})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"]["message"],
        "no fields to update"
    );

    let after = send(&app, request("GET", &format!("/events/{id}"), Some(&user), None)).await;
    assert_eq!(after.headers()[header::ETAG], etag);
}

#[rstest]
#[case("GET", "/events")]
#[case("POST", "/events")]
#[case("GET", "/events/not-an-id")]
#[case("DELETE", "/events/not-an-id")]
#[tokio::test]
async fn it_should_require_a_valid_identity(
    #[case] method: &str,
    #[case] uri: &str,
    #[values(None, Some("not-a-user"))] user: Option<&str>,
) {
    let response = send(&app(), request(method, uri, user, Some(json!({})))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case("GET")]
#[case("PATCH")]
#[case("DELETE")]
#[tokio::test]
async fn it_should_reject_malformed_event_ids(#[case] method: &str) {
    let user = Uuid::new_v4().to_string();
    let body = Some(json!({"title": "x"}));
    let response = send(&app(), request(method, "/events/65f1c0ffee", Some(&user), body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn it_should_reject_malformed_json() {
    let user = Uuid::new_v4().to_string();
    let response = send(
        &app(),
        Request::post("/events")
            .header(USER_HEADER, user)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not-json"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn it_should_return_500_when_the_store_is_offline() {
    let mut store = InMemoryEventStore::new();
    store.toggle_offline();
    let app = app_with(store);
    let user = Uuid::new_v4().to_string();

    let response = send(
        &app,
        request("POST", "/events", Some(&user), Some(json!({"title": "x"}))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"]["message"],
        "could not create event"
    );
}

#[tokio::test]
async fn it_should_set_a_deadline_and_ignore_a_null_one() {
    let app = app();
    let user = Uuid::new_v4().to_string();
    let id = create(&app, &user, json!({"title": "A"})).await;
    let uri = format!("/events/{id}");

    let set = send(
        &app,
        request(
            "PATCH",
            &uri,
            Some(&user),
            Some(json!({"deadline": "2030-01-01T00:00:00Z"})),
        ),
    )
    .await;
    assert_eq!(set.status(), StatusCode::OK);

    let cleared = send(
        &app,
        request("PATCH", &uri, Some(&user), Some(json!({"deadline": null}))),
    )
    .await;
    assert_eq!(cleared.status(), StatusCode::BAD_REQUEST);

    let event = json_body(send(&app, request("GET", &uri, Some(&user), None)).await).await;
    assert_eq!(event["deadline"], "2030-01-01T00:00:00Z");
    assert_eq!(event["title"], "A");
}

#[tokio::test]
async fn it_should_merge_description_and_status() {
    let app = app();
    let user = Uuid::new_v4().to_string();
    let id = create(
        &app,
        &user,
        json!({"title": "Book Drive", "description": "old", "location": "Hall"}),
    )
    .await;
    let uri = format!("/events/{id}");

    let updated = send(
        &app,
        request(
            "PUT",
            &uri,
            Some(&user),
            Some(json!({"description": "Collect used books", "status": "CLOSED", "location": ""})),
        ),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);

    let event = json_body(send(&app, request("GET", &uri, Some(&user), None)).await).await;
    assert_eq!(event["title"], "Book Drive");
    assert_eq!(event["description"], "Collect used books");
    assert_eq!(event["status"], "CLOSED");
    assert_eq!(event["location"], "Hall");
}

#[tokio::test]
async fn it_should_answer_a_conditional_get_with_304() {
    let app = app();
    let user = Uuid::new_v4().to_string();
    let id = create(&app, &user, json!({"title": "Book Drive"})).await;
    let uri = format!("/events/{id}");

    let first = send(&app, request("GET", &uri, Some(&user), None)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers()[header::ETAG].clone();
    let last_modified = first.headers()[header::LAST_MODIFIED].to_str().unwrap();
    assert!(last_modified.ends_with(" GMT"));

    let mut conditional = request("GET", &uri, Some(&user), None);
    conditional
        .headers_mut()
        .insert(header::IF_NONE_MATCH, etag.clone());
    let not_modified = send(&app, conditional).await;
    assert_eq!(not_modified.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(not_modified.headers()[header::ETAG], etag);
    let bytes = not_modified.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    let mut stale = request("GET", &uri, Some(&user), None);
    stale
        .headers_mut()
        .insert(header::IF_NONE_MATCH, "\"stale\"".parse().unwrap());
    let refreshed = send(&app, stale).await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    assert_eq!(json_body(refreshed).await["title"], "Book Drive");
}
