use anyhow::Context;
use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::{Html, Redirect},
    routing::get,
    Form, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::dto::TodoForm;
use super::repo;
use crate::{db, error::AppError, state::AppState};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/update/:id", get(edit_todo).post(update_todo))
        .route("/delete/:id", get(delete_todo))
}

pub fn debug_routes() -> Router<AppState> {
    Router::new().route("/show", get(show_todos))
}

pub const SHOW_PLACEHOLDER: &str = "This is the products page";

#[instrument(skip(state))]
pub async fn list_todos(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    db::ensure_table(&state).await;

    let mut tx = state.db.begin().await.context("begin tx")?;
    let todos = repo::list_todos(&mut tx).await?;
    tx.commit().await.context("commit tx")?;

    Ok(Html(state.templates.render_list(&todos)?))
}

/// Inserts, then re-renders the list in the same response.
#[instrument(skip(state, form))]
pub async fn create_todo(
    State(state): State<AppState>,
    form: Result<Form<TodoForm>, FormRejection>,
) -> Result<Html<String>, AppError> {
    db::ensure_table(&state).await;
    let Form(form) = form?;

    let mut tx = state.db.begin().await.context("begin tx")?;
    let todo = repo::insert_todo(&mut tx, &form.title, &form.desc, OffsetDateTime::now_utc()).await?;
    let todos = repo::list_todos(&mut tx).await?;
    tx.commit().await.context("commit tx")?;

    info!(id = todo.id, title = %todo.title, "todo created");
    Ok(Html(state.templates.render_list(&todos)?))
}

#[instrument(skip(state))]
pub async fn edit_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    db::ensure_table(&state).await;

    let mut tx = state.db.begin().await.context("begin tx")?;
    let todo = repo::find_todo(&mut tx, id)
        .await?
        .ok_or(AppError::NotFound(id))?;
    tx.commit().await.context("commit tx")?;

    Ok(Html(state.templates.render_edit(&todo)?))
}

#[instrument(skip(state, form))]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: Result<Form<TodoForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    db::ensure_table(&state).await;
    let Form(form) = form?;

    let mut tx = state.db.begin().await.context("begin tx")?;
    let todo = repo::update_todo(&mut tx, id, &form.title, &form.desc)
        .await?
        .ok_or(AppError::NotFound(id))?;
    tx.commit().await.context("commit tx")?;

    info!(id = todo.id, title = %todo.title, "todo updated");
    Ok(Redirect::to("/"))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    db::ensure_table(&state).await;

    let mut tx = state.db.begin().await.context("begin tx")?;
    if !repo::delete_todo(&mut tx, id).await? {
        return Err(AppError::NotFound(id));
    }
    tx.commit().await.context("commit tx")?;

    info!(id, "todo deleted");
    Ok(Redirect::to("/"))
}

/// Dumps every todo to the log.
#[instrument(skip(state))]
pub async fn show_todos(State(state): State<AppState>) -> Result<&'static str, AppError> {
    db::ensure_table(&state).await;

    let mut tx = state.db.begin().await.context("begin tx")?;
    let todos = repo::list_todos(&mut tx).await?;
    tx.commit().await.context("commit tx")?;

    for todo in &todos {
        info!(%todo, "todo");
    }
    info!(count = todos.len(), "listed todos");
    Ok(SHOW_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(res: Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn row_count(state: &AppState) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM todos")
            .fetch_one(&state.db)
            .await
            .unwrap()
    }

    async fn setup() -> (AppState, Router) {
        let state = AppState::in_memory().await;
        let app = build_app(state.clone());
        (state, app)
    }

    fn location(res: &Response) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn empty_list_renders() {
        let (_state, app) = setup().await;
        let res = send(&app, get_req("/")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("No todos found"));
    }

    #[tokio::test]
    async fn create_renders_list_with_new_row() {
        let (state, app) = setup().await;
        let res = send(&app, post_form("/", "title=Buy+milk&desc=2%25+milk%2C+1+gallon")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Buy milk"));
        assert!(html.contains("2% milk, 1 gallon"));
        assert_eq!(row_count(&state).await, 1);

        let mut conn = state.db.acquire().await.unwrap();
        let todos = repo::list_todos(&mut conn).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Buy milk");
        assert_eq!(todos[0].description, "2% milk, 1 gallon");
    }

    #[tokio::test]
    async fn create_without_title_or_desc_is_rejected() {
        let (state, app) = setup().await;

        let res = send(&app, post_form("/", "desc=only+desc")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = send(&app, post_form("/", "title=only+title")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        assert_eq!(row_count(&state).await, 0);
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let (state, app) = setup().await;

        send(&app, post_form("/", "title=Buy+milk&desc=2%25+milk%2C+1+gallon")).await;

        let res = send(&app, get_req("/update/1")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains(r#"value="Buy milk""#));
        assert!(html.contains(r#"value="2% milk, 1 gallon""#));

        let res = send(&app, post_form("/update/1", "title=Buy+eggs&desc=a+dozen")).await;
        assert!(res.status().is_redirection());
        assert_eq!(location(&res), "/");

        let html = body_text(send(&app, get_req("/")).await).await;
        assert!(html.contains("Buy eggs"));
        assert!(!html.contains("Buy milk"));

        let mut conn = state.db.acquire().await.unwrap();
        let todo = repo::find_todo(&mut conn, 1).await.unwrap().unwrap();
        assert_eq!(todo.id, 1);
        assert_eq!(todo.description, "a dozen");
        drop(conn);

        let res = send(&app, get_req("/delete/1")).await;
        assert!(res.status().is_redirection());
        assert_eq!(location(&res), "/");

        let html = body_text(send(&app, get_req("/")).await).await;
        assert!(!html.contains("Buy eggs"));
        assert_eq!(row_count(&state).await, 0);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (state, app) = setup().await;
        send(&app, post_form("/", "title=keep&desc=me")).await;

        let res = send(&app, get_req("/update/42")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = send(&app, post_form("/update/42", "title=x&desc=y")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = send(&app, get_req("/delete/42")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        assert_eq!(row_count(&state).await, 1);
    }

    #[tokio::test]
    async fn update_with_missing_field_changes_nothing() {
        let (state, app) = setup().await;
        send(&app, post_form("/", "title=keep&desc=me")).await;

        let res = send(&app, post_form("/update/1", "title=changed")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let mut conn = state.db.acquire().await.unwrap();
        let todo = repo::find_todo(&mut conn, 1).await.unwrap().unwrap();
        assert_eq!(todo.title, "keep");
    }

    #[tokio::test]
    async fn non_numeric_id_is_client_error() {
        let (_state, app) = setup().await;
        let res = send(&app, get_req("/update/abc")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn show_returns_placeholder() {
        let (_state, app) = setup().await;
        send(&app, post_form("/", "title=a&desc=b")).await;
        let res = send(&app, get_req("/show")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, SHOW_PLACEHOLDER);
    }

    #[tokio::test]
    async fn unreachable_store_is_server_error() {
        let app = build_app(AppState::unreachable());
        let res = send(&app, get_req("/")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
