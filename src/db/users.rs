//! Database queries for users.

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;

use super::parse_timestamp;

/// Username of the sentinel account used as a fallback project owner.
pub const SYSTEM_USERNAME: &str = "system";

const SYSTEM_EMAIL: &str = "system@taskhub.qa";
const SYSTEM_PASSWORD: &str = "system123";

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: String,
    updated_at: String,
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_user(row: UserRow) -> AppResult<User> {
    Ok(User {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| AppError::Database(format!("Invalid user id '{}': {}", row.id, e)))?,
        username: row.username,
        email: row.email,
        password_hash: row.password_hash,
        role: row.role,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

/// Insert a new user. Uniqueness violations on username/email surface as
/// database errors; callers pre-check and answer with a conflict instead.
pub fn insert_user(conn: &Connection, user: &User) -> AppResult<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username.as_str(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.role.as_str(),
            user.created_at.to_rfc3339(),
            user.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to insert user: {}", e)))?;

    Ok(())
}

fn get_user_where(conn: &Connection, clause: &str, value: &str) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, clause);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let result = stmt.query_row(params![value], read_user_row);

    match result {
        Ok(row) => Ok(Some(row_to_user(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}

/// Get a user by ID.
pub fn get_user_by_id(conn: &Connection, id: Uuid) -> AppResult<Option<User>> {
    get_user_where(conn, "id", &id.to_string())
}

/// Get a user by username.
pub fn get_user_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    get_user_where(conn, "username", username)
}

/// Get a user by email.
pub fn get_user_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
    get_user_where(conn, "email", email)
}

/// List all users, newest first.
pub fn list_users(conn: &Connection) -> AppResult<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users ORDER BY created_at DESC",
        USER_COLUMNS
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map([], read_user_row)
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_user).collect()
}

/// Write the mutable fields of a user back to its row.
pub fn update_user(conn: &Connection, user: &User) -> AppResult<()> {
    conn.execute(
        "UPDATE users SET username = ?1, email = ?2, role = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            user.username.as_str(),
            user.email.as_str(),
            user.role.as_str(),
            user.updated_at.to_rfc3339(),
            user.id.to_string(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?;

    Ok(())
}

/// Delete a user. Owned projects and created test cases cascade at the
/// schema level; assignments are set to null.
pub fn delete_user(conn: &Connection, id: Uuid) -> AppResult<()> {
    conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])
        .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

    Ok(())
}

/// Find the sentinel system user, creating it if it does not exist yet.
///
/// The insert uses ON CONFLICT DO NOTHING so two concurrent first-time
/// callers cannot race each other into a uniqueness failure.
pub fn find_or_create_system_user(conn: &Connection) -> AppResult<User> {
    if let Some(user) = get_user_by_username(conn, SYSTEM_USERNAME)? {
        return Ok(user);
    }

    let user = User::new(SYSTEM_USERNAME, SYSTEM_EMAIL, SYSTEM_PASSWORD, None)?;
    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(username) DO NOTHING",
        params![
            user.id.to_string(),
            user.username.as_str(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.role.as_str(),
            user.created_at.to_rfc3339(),
            user.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to create system user: {}", e)))?;

    get_user_by_username(conn, SYSTEM_USERNAME)?
        .ok_or_else(|| AppError::Database("Failed to fetch system user after insert".to_string()))
}
