use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainError, DomainResult, User, UserRepository, UserUpdate, UserWithBlobs};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::error::{store, store_err, violation, Violation};
use super::queries;
use crate::flatten::{flatten_user_with_blobs, UserBlobRow};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<DateTime<Utc>>,
    image: Option<String>,
    username: Option<String>,
    bio: Option<String>,
    avatar_icon: String,
    avatar_color: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            email_verified: row.email_verified,
            image: row.image,
            username: row.username,
            bio: row.bio,
            avatar_icon: row.avatar_icon,
            avatar_color: row.avatar_color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepo {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(queries::USER_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("UserRepository::find_by_id"))?;
        Ok(row.map(User::from))
    }

    async fn find_by_username_with_blobs(
        &self,
        username: &str,
    ) -> DomainResult<Option<UserWithBlobs>> {
        const OP: &str = "UserRepository::find_by_username_with_blobs";
        let rows: Vec<UserBlobRow> = sqlx::query_as(queries::USER_WITH_BLOBS_BY_USERNAME)
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err(OP))?;

        flatten_user_with_blobs(&rows).map_err(|e| e.into_domain(OP))
    }

    async fn update(
        &self,
        user_id: &str,
        previous_email: &str,
        update: &UserUpdate,
    ) -> DomainResult<()> {
        const OP: &str = "UserRepository::update";

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(r#"UPDATE "User" SET "#);
        let mut sets = qb.separated(", ");
        let columns = [
            ("name", &update.name),
            ("email", &update.email),
            ("bio", &update.bio),
            ("image", &update.image),
            ("avatar_icon", &update.avatar_icon),
            ("avatar_color", &update.avatar_color),
        ];
        for (column, value) in columns {
            if let Some(value) = value {
                sets.push(column)
                    .push_unseparated(" = ")
                    .push_bind_unseparated(value.clone());
            }
        }
        sets.push("updated_at = now()");
        qb.push(" WHERE id = ").push_bind(user_id);

        let mut tx = self.pool.begin().await.map_err(store_err(OP))?;

        let result = qb
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|err| match violation(&err) {
                Some(Violation::Unique) => {
                    DomainError::AlreadyExists("email is already in use".into())
                }
                _ => store(OP, err),
            })?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("user", user_id.to_owned()));
        }

        if let Some(new_email) = &update.email {
            if new_email != previous_email {
                sqlx::query(queries::DELETE_VERIFICATION_TOKENS)
                    .bind(previous_email)
                    .execute(&mut *tx)
                    .await
                    .map_err(store_err(OP))?;
            }
        }

        tx.commit().await.map_err(store_err(OP))?;
        Ok(())
    }
}
