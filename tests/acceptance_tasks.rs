use anyhow::bail;
use async_trait::async_trait;
use axum::body::to_bytes;
use axum::Router;
use serde_json::{json, Value};
use tarefas::application::task_service::TaskServiceImpl;
use tarefas::config::DatabaseConfig;
use tarefas::domain::{repository::TaskRepository, task::{NewTask, Task, TaskId, TaskStatus}};
use tarefas::http::routing::{self, tasks};

async fn app() -> Router {
    // use in-memory sqlite for tests
    let service = tarefas::open_service(&DatabaseConfig::in_memory()).await.unwrap();
    tarefas::build_router(service)
}

#[tokio::test]
async fn acceptance_create_get_update_delete() {
    let app = app().await;

    // create
    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "Buy milk", "status": "pendente" }))).await;
    assert_eq!(res.status(), 201);
    let created = body_json(res).await;
    assert_eq!(created["titulo"], "Buy milk");
    assert_eq!(created["status"], "pendente");
    assert_eq!(created["descricao"], Value::Null);
    assert_eq!(created["data_vencimento"], Value::Null);
    let id = created["id"].as_i64().unwrap();

    // get
    let res = request(&app, "GET", &format!("/tarefas/{id}"), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await, created);

    // update
    let res = request(&app, "PUT", &format!("/tarefas/{id}"), Some(json!({ "titulo": "Buy milk", "status": "concluída" }))).await;
    assert_eq!(res.status(), 200);
    let updated = body_json(res).await;
    assert_eq!(updated["status"], "concluída");
    assert_eq!(updated["id"], id);

    // delete
    let res = request(&app, "DELETE", &format!("/tarefas/{id}"), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await, json!({ "message": "Tarefa excluída com sucesso" }));

    // get 404
    let res = request(&app, "GET", &format!("/tarefas/{id}"), None).await;
    assert_eq!(res.status(), 404);
    assert_eq!(body_json(res).await, json!({ "error": "Tarefa não encontrada" }));

    // delete again
    let res = request(&app, "DELETE", &format!("/tarefas/{id}"), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn acceptance_validation_messages() {
    let app = app().await;
    let cases = [
        (json!({ "status": "pendente" }), "Título e status são obrigatórios"),
        (json!({ "titulo": "X" }), "Título e status são obrigatórios"),
        (json!({ "titulo": "", "status": "pendente" }), "Título e status são obrigatórios"),
        (json!({ "titulo": "X", "status": "done" }), "Status inválido"),
        (json!({ "titulo": "X", "status": "pendente", "data_vencimento": "2024-13-40" }), "Data de vencimento inválida"),
        (json!({ "titulo": 5, "status": "pendente" }), "Corpo da requisição inválido"),
    ];
    for (payload, message) in cases {
        let res = request(&app, "POST", "/tarefas", Some(payload.clone())).await;
        assert_eq!(res.status(), 400, "{payload}");
        assert_eq!(body_json(res).await, json!({ "error": message }), "{payload}");
    }

    let res = request(&app, "GET", "/tarefas", None).await;
    assert_eq!(body_json(res).await, json!([]));
}

#[tokio::test]
async fn acceptance_non_json_body_is_rejected() {
    let app = app().await;
    let res = raw_request(&app, "POST", "/tarefas", Some("text/plain"), "titulo=x").await;
    assert_eq!(res.status(), 400);
    assert_eq!(body_json(res).await, json!({ "error": "Corpo da requisição inválido" }));
}

#[tokio::test]
async fn acceptance_due_dates() {
    let app = app().await;
    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "X", "status": "realizando", "data_vencimento": "2024-05-01", "descricao": "d" }))).await;
    assert_eq!(res.status(), 201);
    let created = body_json(res).await;
    assert_eq!(created["data_vencimento"], "2024-05-01");
    assert_eq!(created["descricao"], "d");

    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "Y", "status": "pendente", "data_vencimento": null }))).await;
    assert_eq!(res.status(), 201);
}

#[tokio::test]
async fn acceptance_list_filter() {
    let app = app().await;
    for (title, status) in [("a", "pendente"), ("b", "realizando"), ("c", "pendente")] {
        let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": title, "status": status }))).await;
        assert_eq!(res.status(), 201);
    }

    let all = body_json(request(&app, "GET", "/tarefas", None).await).await;
    let titles: Vec<&str> = all.as_array().unwrap().iter().map(|t| t["titulo"].as_str().unwrap()).collect();
    assert_eq!(titles, ["a", "b", "c"]);

    let pending = body_json(request(&app, "GET", "/tarefas?status=pendente", None).await).await;
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let done = body_json(request(&app, "GET", "/tarefas?status=conclu%C3%ADda", None).await).await;
    assert_eq!(done, json!([]));

    let unknown = body_json(request(&app, "GET", "/tarefas?status=arquivada", None).await).await;
    assert_eq!(unknown, all);

    // repeated key: the first value is the filter
    let res = request(&app, "GET", "/tarefas?status=pendente&status=foo", None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await, pending);

    let res = request(&app, "GET", "/tarefas?status=foo&status=pendente", None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await, all);
}

#[tokio::test]
async fn acceptance_update_overwrites_all_fields() {
    let app = app().await;
    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "X", "descricao": "old", "status": "pendente", "data_vencimento": "2024-05-01" }))).await;
    let id = body_json(res).await["id"].as_i64().unwrap();

    let res = request(&app, "PUT", &format!("/tarefas/{id}"), Some(json!({ "titulo": "Y", "status": "realizando" }))).await;
    assert_eq!(res.status(), 200);

    let fetched = body_json(request(&app, "GET", &format!("/tarefas/{id}"), None).await).await;
    assert_eq!(fetched, json!({ "id": id, "titulo": "Y", "descricao": null, "status": "realizando", "data_vencimento": null }));
}

#[tokio::test]
async fn acceptance_update_validation_messages() {
    let app = app().await;
    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "X", "status": "pendente" }))).await;
    let created = body_json(res).await;
    let id = created["id"].as_i64().unwrap();

    let cases = [
        (json!({ "titulo": "X" }), "Título e status são obrigatórios"),
        (json!({ "titulo": "X", "status": "pendente", "data_vencimento": "2024-02-30" }), "Data de vencimento inválida"),
        (json!({ "titulo": "X", "status": "feito" }), "Status inválido"),
    ];
    for (payload, message) in cases {
        let res = request(&app, "PUT", &format!("/tarefas/{id}"), Some(payload.clone())).await;
        assert_eq!(res.status(), 400, "{payload}");
        assert_eq!(body_json(res).await, json!({ "error": message }), "{payload}");
    }

    // rejected updates leave the row untouched
    let res = request(&app, "GET", &format!("/tarefas/{id}"), None).await;
    assert_eq!(body_json(res).await, created);
}

#[derive(Clone)]
struct FailingStore;

#[async_trait]
impl TaskRepository for FailingStore {
    async fn init(&self) -> anyhow::Result<()> { bail!("disk I/O error") }
    async fn create(&self, _: NewTask) -> anyhow::Result<Task> { bail!("disk I/O error") }
    async fn get(&self, _: TaskId) -> anyhow::Result<Option<Task>> { bail!("disk I/O error") }
    async fn list(&self, _: Option<TaskStatus>) -> anyhow::Result<Vec<Task>> { bail!("disk I/O error") }
    async fn update(&self, _: TaskId, _: NewTask) -> anyhow::Result<Option<Task>> { bail!("disk I/O error") }
    async fn delete(&self, _: TaskId) -> anyhow::Result<bool> { bail!("disk I/O error") }
}

#[tokio::test]
async fn acceptance_store_failures_are_generic_500() {
    let app = routing::app(tasks::router(tasks::AppState { service: TaskServiceImpl::new(FailingStore) }));
    let body = json!({ "titulo": "X", "status": "pendente" });
    let calls = [
        ("POST", "/tarefas", Some(body.clone())),
        ("GET", "/tarefas", None),
        ("GET", "/tarefas/1", None),
        ("PUT", "/tarefas/1", Some(body)),
        ("DELETE", "/tarefas/1", None),
    ];
    for (method, path, payload) in calls {
        let res = request(&app, method, path, payload).await;
        assert_eq!(res.status(), 500, "{method} {path}");
        assert_eq!(body_json(res).await, json!({ "error": "Erro interno no servidor" }), "{method} {path}");
    }

    // validation still answers before the store is reached
    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "X" }))).await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn acceptance_unknown_ids() {
    let app = app().await;
    let body = json!({ "titulo": "X", "status": "pendente" });
    assert_eq!(request(&app, "GET", "/tarefas/999", None).await.status(), 404);
    assert_eq!(request(&app, "PUT", "/tarefas/999", Some(body.clone())).await.status(), 404);
    assert_eq!(request(&app, "DELETE", "/tarefas/999", None).await.status(), 404);
    assert_eq!(request(&app, "GET", "/tarefas/abc", None).await.status(), 404);

    // ids that do not even decode as text are unknown too
    for (method, body) in [("GET", None), ("PUT", Some(body.clone())), ("DELETE", None)] {
        let res = request(&app, method, "/tarefas/%FF", body).await;
        assert_eq!(res.status(), 404, "{method}");
        assert_eq!(body_json(res).await, json!({ "error": "Tarefa não encontrada" }), "{method}");
    }

    // validation runs before the existence check
    let res = request(&app, "PUT", "/tarefas/999", Some(json!({ "titulo": "X", "status": "nope" }))).await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn acceptance_ids_are_unique_and_increasing() {
    let app = app().await;
    let mut last = 0;
    for i in 0..3 {
        let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": format!("t{i}"), "status": "pendente" }))).await;
        let id = body_json(res).await["id"].as_i64().unwrap();
        assert!(id > last);
        last = id;
    }
    assert_eq!(request(&app, "DELETE", &format!("/tarefas/{last}"), None).await.status(), 200);
    let res = request(&app, "POST", "/tarefas", Some(json!({ "titulo": "again", "status": "pendente" }))).await;
    assert!(body_json(res).await["id"].as_i64().unwrap() > last);
}

#[tokio::test]
async fn acceptance_health() {
    let app = app().await;
    let res = request(&app, "GET", "/health", None).await;
    assert_eq!(res.status(), 200);
}

async fn body_json(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> hyper::Response<axum::body::Body> {
    match body {
        Some(json) => raw_request(app, method, path, Some("application/json"), &json.to_string()).await,
        None => raw_request(app, method, path, None, "").await,
    }
}

async fn raw_request(app: &Router, method: &str, path: &str, content_type: Option<&str>, body: &str) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match content_type {
        Some(ct) => req.header("content-type", ct).body(Body::from(body.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}
