// db/testutils.rs
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::usermodel::{User, UserRole};

/// Accounts normally come from the auth service; tests insert them directly.
pub async fn insert_user(pool: &PgPool, name: &str, role: UserRole) -> User {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, role)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, role, created_at
        "#,
    )
    .bind(name)
    .bind(format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()))
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}
