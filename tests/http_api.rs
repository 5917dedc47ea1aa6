use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use debease::{Config, EnqueueResponse, InstallJob, JobStatus, Orchestrator, PackagePage};

/// Orchestrator whose worker loops are never started, so jobs stay queued.
fn idle() -> (Orchestrator, Router) {
    let orch = Orchestrator::builder(Config::default()).build();
    let app = orch.router();
    (orch, app)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn enqueue_returns_queued_job() {
    let (orch, app) = idle();

    let (status, body) = send(&app, post_json("/enqueue", json!({"package": "vim"}).to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let res: EnqueueResponse = serde_json::from_value(body).unwrap();
    assert_eq!(res.status, JobStatus::Queued);

    let stored = orch.store().get(&res.job_id).await.unwrap();
    assert_eq!(stored.package, "vim");
    assert_eq!(orch.store().queued_len().await, 1);
}

#[tokio::test]
async fn enqueue_trims_package_name() {
    let (orch, app) = idle();

    let (status, body) = send(&app, post_json("/enqueue", r#"{"package":"  htop "}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let res: EnqueueResponse = serde_json::from_value(body).unwrap();
    assert_eq!(orch.store().get(&res.job_id).await.unwrap().package, "htop");
}

#[tokio::test]
async fn enqueue_rejects_bad_requests() {
    let (orch, app) = idle();

    for body in [r#"{}"#, r#"{"package":""}"#, r#"{"package":"   "}"#, r#"{"package":null}"#, r#"{"package":"-y"}"#, "not json"] {
        let (status, res) = send(&app, post_json("/enqueue", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert!(res["detail"].is_string(), "body {body}: {res}");
    }

    let (status, res) = send(&app, post_json("/enqueue", r#"{}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["detail"], "package required");

    let missing_content_type = Request::post("/enqueue")
        .body(Body::from(r#"{"package":"vim"}"#))
        .unwrap();
    let (status, _) = send(&app, missing_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(orch.store().is_empty().await);
}

#[tokio::test]
async fn queue_lists_jobs_in_submission_order() {
    let (_orch, app) = idle();

    let (status, body) = send(&app, get("/queue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    for name in ["vim", "git"] {
        let (status, _) = send(&app, post_json("/enqueue", json!({ "package": name }).to_string())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/queue")).await;
    assert_eq!(status, StatusCode::OK);
    let raw = body.as_array().unwrap();
    assert_eq!(raw[0]["status"], "queued");
    assert_eq!(raw[0]["started_at"], Value::Null);
    assert_eq!(raw[0]["finished_at"], Value::Null);
    assert_eq!(raw[0]["exit_code"], Value::Null);
    assert_eq!(raw[0]["log"], json!([]));

    let jobs: Vec<InstallJob> = serde_json::from_value(body).unwrap();
    let names: Vec<&str> = jobs.iter().map(|j| j.package.as_str()).collect();
    assert_eq!(names, vec!["vim", "git"]);
}

#[tokio::test]
async fn job_lookup_by_id() {
    let (orch, app) = idle();
    let job = orch.store().enqueue("curl").await;

    let (status, body) = send(&app, get(&format!("/jobs/{}", job.job_id))).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: InstallJob = serde_json::from_value(body).unwrap();
    assert_eq!(fetched, job);

    let unknown = debease::JobId::new();
    let (status, body) = send(&app, get(&format!("/jobs/{unknown}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "job not found");

    let (status, _) = send(&app, get("/jobs/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn packages_search_and_paging() {
    let (_orch, app) = idle();

    let (status, body) = send(&app, get("/packages")).await;
    assert_eq!(status, StatusCode::OK);
    let page: PackagePage = serde_json::from_value(body).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 1);
    assert_eq!(page.items.len(), 5);

    let (_, body) = send(&app, get("/packages?q=VIM")).await;
    let page: PackagePage = serde_json::from_value(body).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "vim");

    let (_, body) = send(&app, get("/packages?page=3&size=2")).await;
    let page: PackagePage = serde_json::from_value(body).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "nginx");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (_orch, app) = idle();
    let res = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
