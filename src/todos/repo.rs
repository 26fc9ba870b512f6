use anyhow::Context;
use sqlx::AnyConnection;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::repo_types::{Todo, TodoRow};

fn into_todos(rows: Vec<TodoRow>) -> anyhow::Result<Vec<Todo>> {
    rows.into_iter().map(Todo::try_from).collect()
}

/// All todos in store-default order.
pub async fn list_todos(conn: &mut AnyConnection) -> anyhow::Result<Vec<Todo>> {
    let rows = sqlx::query_as::<_, TodoRow>(
        r#"
        SELECT id, title, description, created_at
        FROM todos
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .context("list todos")?;
    into_todos(rows)
}

pub async fn find_todo(conn: &mut AnyConnection, id: i64) -> anyhow::Result<Option<Todo>> {
    let row = sqlx::query_as::<_, TodoRow>(
        r#"
        SELECT id, title, description, created_at
        FROM todos
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("find todo {}", id))?;
    row.map(Todo::try_from).transpose()
}

pub async fn insert_todo(
    conn: &mut AnyConnection,
    title: &str,
    description: &str,
    created_at: OffsetDateTime,
) -> anyhow::Result<Todo> {
    let created_at = created_at.format(&Rfc3339).context("format created_at")?;
    let row = sqlx::query_as::<_, TodoRow>(
        r#"
        INSERT INTO todos (title, description, created_at)
        VALUES ($1, $2, $3)
        RETURNING id, title, description, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await
    .context("insert todo")?;
    Todo::try_from(row)
}

/// Overwrite title and description. `None` when no row has `id`.
pub async fn update_todo(
    conn: &mut AnyConnection,
    id: i64,
    title: &str,
    description: &str,
) -> anyhow::Result<Option<Todo>> {
    let row = sqlx::query_as::<_, TodoRow>(
        r#"
        UPDATE todos
           SET title = $1, description = $2
         WHERE id = $3
        RETURNING id, title, description, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("update todo {}", id))?;
    row.map(Todo::try_from).transpose()
}

/// Returns whether a row was removed.
pub async fn delete_todo(conn: &mut AnyConnection, id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM todos WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("delete todo {}", id))?;
    Ok(res.rows_affected() > 0)
}
