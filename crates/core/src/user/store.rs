//! User persistent store

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::Database;
use crate::{Error, Result};

use super::model::{User, UserRole, UserSummary};
use super::password::{hash_password, validate_password, verify_password};

const USER_COLUMNS: &str = "id, email, display_name, role, created_at, last_login_at";
const USER_LIST_LIMIT: i64 = 50;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
        last_login_at: row.get("last_login_at")?,
    })
}

fn normalize_email(email: &str) -> Result<String> {
    let normalized = email.trim().to_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return Err(Error::InvalidInput("Invalid email".to_string()));
    }
    Ok(normalized)
}

/// User store backed by the board database
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a new account
    ///
    /// The very first account becomes the administrator.
    pub async fn register(&self, email: &str, password: &str, display_name: &str) -> Result<User> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        let display_name = match display_name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let password_hash = hash_password(password);

        let user = self
            .db
            .with_conn(move |conn| {
                let tx = conn.transaction()?;

                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                    params![email],
                    |row| row.get(0),
                )?;
                if exists {
                    return Err(Error::Conflict(format!("User '{}' already exists", email)));
                }

                let existing_users: i64 =
                    tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                let role = if existing_users == 0 {
                    UserRole::Administrator
                } else {
                    UserRole::Member
                };

                let user = User {
                    id: Uuid::new_v4(),
                    email,
                    display_name,
                    role,
                    created_at: Utc::now(),
                    last_login_at: None,
                };
                tx.execute(
                    "INSERT INTO users (id, email, display_name, password_hash, role, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        user.id,
                        user.email,
                        user.display_name,
                        password_hash,
                        user.role,
                        user.created_at
                    ],
                )?;
                tx.commit()?;
                Ok(user)
            })
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Registered user");
        Ok(user)
    }

    /// Check credentials and record the login time
    ///
    /// Returns `None` for an unknown email or a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        let password = password.to_string();

        self.db
            .with_conn(move |conn| {
                let found = conn
                    .query_row(
                        &format!("SELECT {}, password_hash FROM users WHERE email = ?1", USER_COLUMNS),
                        params![email],
                        |row| Ok((user_from_row(row)?, row.get::<_, String>("password_hash")?)),
                    )
                    .optional()?;

                let Some((mut user, password_hash)) = found else {
                    return Ok(None);
                };
                if !verify_password(&password_hash, &password) {
                    return Ok(None);
                }

                let now = Utc::now();
                conn.execute(
                    "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
                    params![now, user.id],
                )?;
                user.last_login_at = Some(now);
                Ok(Some(user))
            })
            .await
    }

    /// Get a user by ID
    pub async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.db
            .with_conn(move |conn| {
                let user = conn
                    .query_row(
                        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                        params![id],
                        user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await
    }

    /// List users for assignee selection, ordered by display name
    pub async fn list(&self) -> Result<Vec<UserSummary>> {
        self.db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM users ORDER BY display_name COLLATE NOCASE ASC LIMIT ?1",
                    USER_COLUMNS
                ))?;
                let users = stmt
                    .query_map(params![USER_LIST_LIMIT], user_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(users.iter().map(UserSummary::from).collect())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_store() -> UserStore {
        UserStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_first_user_is_administrator() {
        let store = build_store();

        let first = store.register("Admin@Example.com", "password-1", "Admin").await.unwrap();
        let second = store.register("dev@example.com", "password-2", "Dev").await.unwrap();

        assert_eq!(first.email, "admin@example.com");
        assert_eq!(first.role, UserRole::Administrator);
        assert_eq!(second.role, UserRole::Member);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = build_store();
        store.register("dev@example.com", "password-1", "Dev").await.unwrap();

        let err = store
            .register("DEV@example.com", "password-2", "Other")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_blank_display_name_falls_back_to_email() {
        let store = build_store();
        let user = store.register("jane@example.com", "password-1", "  ").await.unwrap();
        assert_eq!(user.display_name, "jane");
    }

    #[tokio::test]
    async fn test_authenticate_records_login() {
        let store = build_store();
        let user = store.register("dev@example.com", "password-1", "Dev").await.unwrap();
        assert!(user.last_login_at.is_none());

        let authed = store
            .authenticate(" dev@example.com ", "password-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(authed.id, user.id);
        assert!(authed.last_login_at.is_some());

        let stored = store.get(user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_credentials() {
        let store = build_store();
        store.register("dev@example.com", "password-1", "Dev").await.unwrap();

        assert!(store.authenticate("dev@example.com", "nope-nope").await.unwrap().is_none());
        assert!(store.authenticate("ghost@example.com", "password-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_display_name() {
        let store = build_store();
        store.register("z@example.com", "password-1", "zoe").await.unwrap();
        store.register("a@example.com", "password-1", "Adam").await.unwrap();
        store.register("m@example.com", "password-1", "Mia").await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Adam", "Mia", "zoe"]);
    }
}
