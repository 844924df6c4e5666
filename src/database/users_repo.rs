use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::{UserRole, UsersRow};

const SQL_LOAD_USER: &str = r#"
SELECT
  user_id,
  name,
  role,
  points
FROM users
WHERE user_id = ?1
LIMIT 1
"#;

pub async fn load_user(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_USER)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

// Users are provisioned by the auth service. The token's role wins; the name falls back
// to the stored one, then to the user id.
const SQL_UPSERT_USER: &str = r#"
INSERT INTO users (user_id, name, role)
VALUES (?1, COALESCE(?2, ?1), ?3)
ON CONFLICT (user_id) DO UPDATE SET
  name = COALESCE(?2, users.name),
  role = excluded.role
"#;

pub async fn upsert_user(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    name: Option<&str>,
    role: UserRole,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPSERT_USER)
        .bind(user_id)
        .bind(name)
        .bind(role)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_ADD_POINTS: &str = r#"
UPDATE users
SET points = points + ?1
WHERE user_id = ?2
"#;

pub async fn add_points(conn: &mut SqliteConnection, user_id: &str, points: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_ADD_POINTS)
        .bind(points)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
