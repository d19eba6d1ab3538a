//! Todo and user persistence.
//!
//! Todo mutations filter on owner inside the same statement (delete) or
//! immediate transaction (update) as the write, so an ownership check cannot go
//! stale before the mutation lands.

use sqlx::{query, query_as, query_scalar, SqliteConnection, SqlitePool};

use crate::{error::AppError, model::Todo, model::User, validation::Registration};

pub const PAGE_SIZE: i64 = 5;

#[derive(Clone)]
pub struct TodoRepository {
    db: SqlitePool,
}

impl TodoRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, text: &str, owner: &str) -> Result<Todo, AppError> {
        let todo = query_as::<_, Todo>(
            "INSERT INTO todos (text, username) VALUES (?, ?) RETURNING id, text, username",
        )
        .bind(text)
        .bind(owner)
        .fetch_one(&self.db)
        .await?;

        tracing::debug!(id = todo.id, owner, "todo created");
        Ok(todo)
    }

    /// One page of the owner's todos in id order. An empty page is an error
    /// that tells "nothing at all" apart from "past the end".
    pub async fn list(&self, owner: &str, skip: i64) -> Result<Vec<Todo>, AppError> {
        let todos = query_as::<_, Todo>(
            "SELECT id, text, username FROM todos WHERE username = ? \
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(owner)
        .bind(PAGE_SIZE)
        .bind(skip)
        .fetch_all(&self.db)
        .await?;

        if todos.is_empty() {
            return Err(if skip == 0 {
                AppError::NoTodos
            } else {
                AppError::NoMoreTodos
            });
        }
        Ok(todos)
    }

    /// Replaces the text and returns the record as it was before the edit.
    ///
    /// Runs under `BEGIN IMMEDIATE`: the write lock is held from the first
    /// read, so a concurrent writer waits on the busy timeout instead of
    /// invalidating the read snapshot. The transaction runs on its own task
    /// so a dropped request cannot leave it open on a pooled connection.
    pub async fn update(&self, id: i64, new_text: &str, requester: &str) -> Result<Todo, AppError> {
        let db = self.db.clone();
        let new_text = new_text.to_owned();
        let requester = requester.to_owned();

        let previous = tokio::spawn(async move {
            Self::update_immediate(db, id, &new_text, &requester).await
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::debug!(id, requester = %previous.username, "todo updated");
        Ok(previous)
    }

    async fn update_immediate(
        db: SqlitePool,
        id: i64,
        new_text: &str,
        requester: &str,
    ) -> Result<Todo, AppError> {
        let mut conn = db.acquire().await?;
        query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = Self::update_locked(&mut conn, id, new_text, requester).await;
        let finish = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(err) = query(finish).execute(&mut *conn).await {
            // never hand a connection with an open transaction back to the pool
            drop(conn.detach());
            return Err(err.into());
        }
        outcome
    }

    async fn update_locked(
        conn: &mut SqliteConnection,
        id: i64,
        new_text: &str,
        requester: &str,
    ) -> Result<Todo, AppError> {
        let previous = query_as::<_, Todo>("SELECT id, text, username FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(AppError::TodoNotFound)?;

        if previous.username != requester {
            return Err(AppError::Forbidden);
        }

        let updated = query("UPDATE todos SET text = ? WHERE id = ? AND username = ?")
            .bind(new_text)
            .bind(id)
            .bind(requester)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(AppError::TodoNotFound);
        }
        Ok(previous)
    }

    /// Deletes the todo if `requester` owns it; returns the deleted row count.
    pub async fn delete(&self, id: i64, requester: &str) -> Result<u64, AppError> {
        let deleted = query("DELETE FROM todos WHERE id = ? AND username = ?")
            .bind(id)
            .bind(requester)
            .execute(&self.db)
            .await?
            .rows_affected();

        if deleted > 0 {
            tracing::debug!(id, requester, "todo deleted");
            return Ok(deleted);
        }

        let exists = query_scalar::<_, i64>("SELECT COUNT(*) FROM todos WHERE id = ?")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if exists > 0 {
            Err(AppError::Forbidden)
        } else {
            Err(AppError::TodoNotFound)
        }
    }
}

#[derive(Clone)]
pub struct UserRepository {
    db: SqlitePool,
}

impl UserRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = query_as::<_, User>(
            "SELECT id, name, email, username, password FROM users WHERE email = ?",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = query_as::<_, User>(
            "SELECT id, name, email, username, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Inserts a user whose password is already hashed.
    pub async fn create(
        &self,
        registration: &Registration,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let result = query_as::<_, User>(
            "INSERT INTO users (name, email, username, password) VALUES (?, ?, ?, ?) \
             RETURNING id, name, email, username, password",
        )
        .bind(&registration.name)
        .bind(&registration.email)
        .bind(&registration.username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "Email or username already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
