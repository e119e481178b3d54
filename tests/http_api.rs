//! HTTP API integration tests
//!
//! Each test builds the router over a fresh temporary workspace and drives it
//! in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

use filedesk_core::server::{build_router, AppContext};
use filedesk_core::store::WorkspaceStore;

struct TestApp {
    _tmp: TempDir,
    root: PathBuf,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("data");
        let fixed = BTreeMap::from([("compose.yaml".to_string(), "stack".to_string())]);
        let store = WorkspaceStore::open(&root, &root.join(".tmp"), fixed).unwrap();
        let root = store.root().to_path_buf();
        Self {
            _tmp: tmp,
            root,
            router: build_router(AppContext::new(store)),
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }
}

#[tokio::test]
async fn test_file_crud() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/file",
            Some(json!({"path": "notes.md", "content": "# hi"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = app.get("/file?path=notes.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "# hi");
    assert_eq!(body["size"], 4);

    let (status, _) = app
        .send(
            Method::PUT,
            "/file",
            Some(json!({"path": "notes.md", "content": "# updated"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fs::read_to_string(app.root.join("notes.md")).unwrap(),
        "# updated"
    );

    let (status, body) = app
        .send(Method::POST, "/file", Some(json!({"path": "notes.md"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "file_already_exists");

    let (status, _) = app.send(Method::DELETE, "/file?path=notes.md", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.root.join("notes.md").exists());

    let (status, body) = app.get("/file?path=notes.md").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "file_not_found");
}

#[tokio::test]
async fn test_tree_listing_order_and_hidden_entries() {
    let app = TestApp::new();
    fs::create_dir(app.root.join("zeta")).unwrap();
    fs::write(app.root.join("Beta.txt"), "b").unwrap();
    fs::write(app.root.join("alpha.txt"), "a").unwrap();

    let (status, body) = app.get("/tree").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["zeta", "alpha.txt", "Beta.txt"]);
    assert_eq!(body["items"][0]["type"], "folder");
    assert_eq!(body["items"][1]["type"], "file");

    let (status, body) = app.get("/tree?path=missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_escape_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/file?path=../../etc/passwd").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "path_outside_workspace");

    let (status, _) = app
        .send(
            Method::PUT,
            "/file",
            Some(json!({"path": "../escape.txt", "content": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_carries_dirty_flag() {
    let app = TestApp::new();
    fs::create_dir(app.root.join("dir1")).unwrap();
    fs::write(app.root.join("dir1/a.txt"), "original").unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            "/temp",
            Some(json!({"path": "dir1/a.txt", "content": "draft"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::POST,
            "/mv",
            Some(json!({"src": "dir1", "dst": "dir2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["src"], "dir1");
    assert_eq!(body["dst"], "dir2");
    assert!(body.get("stale").is_none());

    let (_, body) = app.get("/dirty").await;
    assert_eq!(body["dirty"], json!({"dir2/a.txt": true}));

    let (_, body) = app.get("/temp?path=dir2/a.txt").await;
    assert_eq!(body["exists"], true);
    assert_eq!(body["content"], "draft");

    let (_, body) = app.get("/tree?path=dir2").await;
    assert_eq!(body["items"][0]["dirty"], true);
}

#[tokio::test]
async fn test_move_conflicts() {
    let app = TestApp::new();
    fs::create_dir(app.root.join("a")).unwrap();
    fs::write(app.root.join("b.txt"), "b").unwrap();

    let (status, body) = app
        .send(Method::POST, "/mv", Some(json!({"src": "a", "dst": "a/inner"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "move_into_self");

    let (status, _) = app
        .send(Method::POST, "/mv", Some(json!({"src": "b.txt", "dst": "a"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::POST, "/mv", Some(json!({"src": "nope", "dst": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backup_and_restore() {
    let app = TestApp::new();
    fs::write(app.root.join("config.yaml"), "v: 1\n").unwrap();

    let (status, body) = app.send(Method::POST, "/backup?path=config.yaml", None).await;
    assert_eq!(status, StatusCode::OK);
    let backup = body["backup"].as_str().unwrap().to_string();
    assert!(backup.starts_with(".backups/config/backup---config---"));
    assert!(backup.ends_with(".yaml"));

    let (_, body) = app.get("/backups?path=config.yaml").await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["path"], backup.as_str());

    fs::write(app.root.join("config.yaml"), "v: 2\n").unwrap();
    let uri = format!("/backup/restore?file=config.yaml&backup={}", backup);
    let (status, _) = app.send(Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fs::read_to_string(app.root.join("config.yaml")).unwrap(),
        "v: 1\n"
    );

    let (status, _) = app
        .send(Method::DELETE, &format!("/backup?backup={}", backup), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/backups?path=config.yaml").await;
    assert!(body["items"].as_array().unwrap().is_empty());

    // The backup area is not listed in the tree
    let (_, body) = app.get("/tree").await;
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|i| i["name"] != ".backups"));
}

#[tokio::test]
async fn test_drafts_and_dirty_flags() {
    let app = TestApp::new();
    fs::write(app.root.join("a.txt"), "saved").unwrap();

    let (status, body) = app
        .send(Method::PUT, "/temp?path=a.txt&content=unsaved", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "a.txt");

    let (status, body) = app.send(Method::PUT, "/temp", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "missing_path");

    let (_, body) = app.get("/dirty").await;
    assert_eq!(body["dirty"]["a.txt"], true);

    // Saving the real file clears the flag
    app.send(
        Method::PUT,
        "/file",
        Some(json!({"path": "a.txt", "content": "unsaved"})),
    )
    .await;
    let (_, body) = app.get("/dirty").await;
    assert_eq!(body["dirty"], json!({}));

    let (status, _) = app.send(Method::DELETE, "/temp?path=a.txt", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/temp?path=a.txt").await;
    assert_eq!(body["exists"], false);
    assert!(body.get("content").is_none());
}

#[tokio::test]
async fn test_container_associations() {
    let app = TestApp::new();
    fs::write(app.root.join("app.env"), "X=1").unwrap();

    let (_, body) = app.get("/file/container?path=compose.yaml").await;
    assert_eq!(body["container"], "stack");

    let (status, _) = app
        .send(
            Method::PUT,
            "/file/container",
            Some(json!({"path": "app.env", "container": "  web  "})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/file/container?path=app.env").await;
    assert_eq!(body["container"], "web");

    let (status, body) = app
        .send(
            Method::PUT,
            "/file/container",
            Some(json!({"path": "app.env", "container": "   "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_container");

    let (_, body) = app.get("/containers/map").await;
    assert_eq!(body["map"], json!({"app.env": "web"}));

    let (status, _) = app
        .send(Method::DELETE, "/file/container?path=app.env", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/file/container?path=app.env").await;
    assert_eq!(body["container"], Value::Null);
}

#[tokio::test]
async fn test_search_and_mkdir() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Method::POST, "/mkdir", Some(json!({"path": "conf"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    fs::write(app.root.join("conf/Nginx.conf"), "").unwrap();
    fs::write(app.root.join("other.txt"), "").unwrap();

    let (status, body) = app.get("/search?q=nginx").await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["path"], "conf/Nginx.conf");

    let (status, body) = app.get("/search?q=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "missing_query");
}

#[tokio::test]
async fn test_validate_endpoint() {
    let app = TestApp::new();

    let (_, body) = app
        .send(
            Method::POST,
            "/validate",
            Some(json!({"path": "a.json", "content": "{\"a\": 1}"})),
        )
        .await;
    assert_eq!(body["success"], true);

    let (_, body) = app
        .send(
            Method::POST,
            "/validate",
            Some(json!({"path": "a.json", "content": "{broken"})),
        )
        .await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_browser_navigation_is_forbidden() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/tree")
        .header(header::ACCEPT, "text/html,application/xhtml+xml")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    fs::write(app.root.join("app.env"), "X=1").unwrap();
    app.send(
        Method::PUT,
        "/file/container",
        Some(json!({"path": "app.env", "container": "web"})),
    )
    .await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data_ok"], true);
    assert_eq!(body["temp_ok"], true);
    assert_eq!(body["associations"]["compose.yaml"], "stack");
    assert_eq!(body["containers"]["stack"]["files"], json!(["compose.yaml"]));
    assert_eq!(body["containers"]["web"]["files"], json!(["app.env"]));
    assert_eq!(body["sources"]["static_count"], 1);
    assert_eq!(body["sources"]["dynamic_count"], 1);
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let app = TestApp::new();

    let (status, body) = app.get("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = app.get("/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["data_dir_ok"], true);
    assert_eq!(body["temp_dir_ok"], true);

    fs::remove_dir_all(app.root.join(".tmp")).unwrap();
    let (status, body) = app.get("/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ok"], false);
    assert_eq!(body["temp_dir_ok"], false);
}

#[tokio::test]
async fn test_store_data_is_not_writable_through_file_routes() {
    let app = TestApp::new();
    fs::write(app.root.join("f.txt"), "v").unwrap();
    app.send(Method::POST, "/backup?path=f.txt", None).await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/file",
            Some(json!({"path": ".backups/index.json", "content": "{}"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "path_reserved");

    let (status, _) = app
        .send(Method::DELETE, "/file?path=.file_containers.json", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/mv",
            Some(json!({"src": ".backups", "dst": "archive"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/backups?path=f.txt").await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_association_lookup_normalizes_paths() {
    let app = TestApp::new();
    fs::write(app.root.join("a.txt"), "").unwrap();
    app.send(
        Method::PUT,
        "/file/container",
        Some(json!({"path": "a.txt", "container": "svc"})),
    )
    .await;

    let (_, body) = app.get("/file/container?path=./a.txt").await;
    assert_eq!(body["container"], "svc");
}
