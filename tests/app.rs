use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc, Mutex};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use scout_list::{build_router, config::Config, AppState};

const DAY: i64 = 86_400_000;

#[derive(Clone)]
struct Upstream {
    listing: Value,
    edit_status: Option<StatusCode>,
    submissions: Arc<Mutex<Vec<Value>>>,
}

async fn list_events(State(upstream): State<Upstream>) -> Json<Value> {
    Json(upstream.listing.clone())
}

async fn edit_events(State(upstream): State<Upstream>, Json(body): Json<Value>) -> Response {
    if let Some(status) = upstream.edit_status {
        return status.into_response();
    }
    if body["password"] != "secret" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    upstream.submissions.lock().unwrap().push(body);
    StatusCode::OK.into_response()
}

/// Fake event service on a local port.
async fn spawn_upstream(listing: Value, edit_status: Option<StatusCode>) -> (SocketAddr, Arc<Mutex<Vec<Value>>>) {
    let submissions = Arc::new(Mutex::new(Vec::new()));
    let upstream = Upstream {
        listing,
        edit_status,
        submissions: submissions.clone(),
    };
    let app = Router::new()
        .route("/list/events", get(list_events))
        .route("/list/edit", post(edit_events))
        .with_state(upstream);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, submissions)
}

fn listing() -> Value {
    let now = chrono::Utc::now().timestamp_millis();
    json!({
        "events": [
            {"id": "u", "datetime": now + 5 * DAY, "location": "Halle C", "league": "Regionalliga",
             "opponent": "Jena", "scouters": ["Anna", "Ben"], "schedule_info": null},
            {"id": "p", "datetime": now - 2 * DAY, "location": "Halle A", "league": "BBL",
             "opponent": "Ulm", "scouters": ["Anna"], "schedule_info": null},
            {"id": "s", "datetime": now + 2 * DAY, "location": "Halle B", "league": "ProB",
             "opponent": "Bonn", "scouters": ["Ben"], "schedule_info": {"game": 42}}
        ],
        "names": ["Ben", "Anna"]
    })
}

fn app_for(addr: SocketAddr) -> Router {
    let mut config = Config::default();
    config.event_service.base_url = format!("http://{}", addr);
    let state = Arc::new(AppState::new(config).unwrap());
    let (app, _cleaner) = build_router(state, Arc::new(AtomicBool::new(true))).unwrap();
    app
}

async fn app_with_upstream(edit_status: Option<StatusCode>) -> (Router, Arc<Mutex<Vec<Value>>>) {
    let (addr, submissions) = spawn_upstream(listing(), edit_status).await;
    (app_for(addr), submissions)
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", "10.0.0.1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn view_page_lists_events_in_time_order() {
    let (app, _) = app_with_upstream(None).await;

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["x-content-type-options"],
        "nosniff"
    );
    let html = body_text(response).await;

    let ulm = html.find("Ulm").unwrap();
    let bonn = html.find("Bonn").unwrap();
    let jena = html.find("Jena").unwrap();
    assert!(ulm < bonn && bonn < jena);

    assert_eq!(html.matches("id=\"next\"").count(), 1);
    assert_eq!(html.matches("class=\"past\"").count(), 1);
    assert_eq!(html.matches("class=\"upcoming\"").count(), 2);
    assert!(html.contains("data-mode=\"view\""));
}

#[tokio::test]
async fn view_page_confirms_successful_submission() {
    let (app, _) = app_with_upstream(None).await;

    let response = app.oneshot(get_request("/?status=ok")).await.unwrap();
    let html = body_text(response).await;
    assert!(html.contains("<p id=\"submitResponse\">Ok</p>"));
}

#[tokio::test]
async fn edit_actions_add_and_delete_rows() {
    let (app, _) = app_with_upstream(None).await;

    let response = app.clone().oneshot(get_request("/edit")).await.unwrap();
    let html = body_text(response).await;
    assert_eq!(html.matches("name=\"row\"").count(), 3);
    assert!(html.contains("value=\"delete:s\" disabled"));
    assert!(html.contains("data-refresh-on-change"));

    let response = app
        .clone()
        .oneshot(form_request("/edit", "row=p&row=s&row=u&action=add"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(html.matches("name=\"row\"").count(), 4);
    assert!(html.contains(" autofocus"));

    let response = app
        .clone()
        .oneshot(form_request("/edit", "row=p&row=s&row=u&action=delete%3As"))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert_eq!(html.matches("name=\"row\"").count(), 3);

    let response = app
        .oneshot(form_request("/edit", "row=p&row=s&row=u&action=delete%3Au"))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert_eq!(html.matches("name=\"row\"").count(), 2);
    assert!(!html.contains("Jena"));
}

#[tokio::test]
async fn refresh_recomputes_statistics_from_posted_rows() {
    let (app, _) = app_with_upstream(None).await;

    // Ben dropped from the upcoming league game: Anna 2, Ben 1
    let body = "row=p&row=s&row=u&scouter.u=Anna&scouter.u=&scouter.u=&action=refresh";
    let response = app.oneshot(form_request("/edit", body)).await.unwrap();
    let html = body_text(response).await;

    let stats = &html[html.find("id=\"statsTable\"").unwrap()..];
    let ben = &stats[stats.find("<td>Ben</td>").unwrap()..];
    let totals: Vec<&str> = ben
        .split("<td>")
        .skip(1)
        .take(5)
        .map(|cell| cell.split("</td>").next().unwrap())
        .collect();
    assert_eq!(totals, vec!["Ben", "0", "1", "0", "1"]);
}

#[tokio::test]
async fn change_triggered_refresh_keeps_edited_values() {
    let (app, submissions) = app_with_upstream(None).await;

    // What the change listener posts: the whole form with the hidden default button.
    let body = "row=p&row=s&row=u&league.u=ProB&scouter.u=Anna&scouter.u=Ben&scouter.u=\
                &password=&action=refresh";
    let response = app.oneshot(form_request("/edit", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("name=\"league.u\" value=\"ProB\""));
    let stats = &html[html.find("id=\"statsTable\"").unwrap()..];
    let anna = &stats[stats.find("<td>Anna</td>").unwrap()..];
    let cells: Vec<&str> = anna
        .split("<td>")
        .skip(1)
        .take(5)
        .map(|cell| cell.split("</td>").next().unwrap())
        .collect();
    assert_eq!(cells, vec!["Anna", "1", "1", "0", "2"]);
    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_password_is_reported_and_cleared() {
    let (app, submissions) = app_with_upstream(None).await;

    let response = app
        .oneshot(form_request(
            "/submit",
            "row=p&row=s&row=u&password=wrong&action=submit",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("Passwort falsch"));
    assert!(html.contains("name=\"password\" value=\"\""));
    assert!(!html.contains("value=\"wrong\""));
    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn successful_submission_reattaches_schedule_info_and_redirects() {
    let (app, submissions) = app_with_upstream(None).await;

    let body = "row=p&row=s&league.s=Hacked&row=u\
                &row=123&date.123=2030-01-01&time.123=&league.123=ProB\
                &scouter.123=Anna&scouter.123=&password=secret&action=submit";
    let response = app.oneshot(form_request("/submit", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/?status=ok");

    let submissions = submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    let events = submissions[0]["events"].as_array().unwrap();
    assert_eq!(events.len(), 4);

    let by_id = |id: &str| events.iter().find(|e| e["id"] == id).unwrap();
    assert_eq!(by_id("p")["schedule_info"], Value::Null);
    assert_eq!(by_id("s")["schedule_info"], json!({"game": 42}));
    assert_eq!(by_id("s")["league"], "ProB");
    assert_eq!(by_id("123")["schedule_info"], Value::Null);
    assert_eq!(by_id("123")["scouters"], json!(["Anna"]));
    assert_eq!(by_id("123")["league"], "ProB");
}

#[tokio::test]
async fn upstream_failure_status_is_shown() {
    let (app, _) = app_with_upstream(Some(StatusCode::INTERNAL_SERVER_ERROR)).await;

    let response = app
        .oneshot(form_request(
            "/submit",
            "row=p&row=s&row=u&password=secret&action=submit",
        ))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("500: Internal Server Error"));
}

#[tokio::test]
async fn submit_action_on_edit_endpoint_is_rejected() {
    let (app, submissions) = app_with_upstream(None).await;

    let response = app
        .oneshot(form_request("/edit", "row=p&password=secret&action=submit"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stats_endpoint_counts_categories() {
    let (app, _) = app_with_upstream(None).await;

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();

    assert_eq!(body["events"], 3);
    assert_eq!(
        body["stats"],
        json!([
            {"name": "Anna", "c1": 1, "c2": 0, "c3": 1, "total": 2},
            {"name": "Ben", "c1": 0, "c2": 1, "c3": 1, "total": 2}
        ])
    );
}

#[tokio::test]
async fn unreachable_event_service_is_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let app = app_for(addr);

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(health["cached_events"], Value::Null);

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
