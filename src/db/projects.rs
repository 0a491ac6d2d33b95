//! Database queries for projects.
//!
//! Reads hydrate `owner_username` via a join and compute `test_cases_count`
//! with a correlated subquery; neither is stored.

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Project;

use super::parse_timestamp;

const PROJECT_SELECT: &str = "SELECT p.id, p.name, p.description, p.owner_id,
            u.username AS owner_username, p.status, p.created_at, p.updated_at,
            (SELECT COUNT(*) FROM test_cases tc WHERE tc.project_id = p.id) AS test_cases_count
     FROM projects p
     LEFT JOIN users u ON p.owner_id = u.id";

struct ProjectRow {
    id: String,
    name: String,
    description: Option<String>,
    owner_id: Option<String>,
    owner_username: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
    test_cases_count: i64,
}

fn read_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        owner_username: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        test_cases_count: row.get(8)?,
    })
}

fn row_to_project(row: ProjectRow) -> AppResult<Project> {
    let owner_id = match row.owner_id {
        Some(raw) => Some(Uuid::parse_str(&raw).map_err(|e| {
            AppError::Database(format!("Invalid project owner id '{}': {}", raw, e))
        })?),
        None => None,
    };

    Ok(Project {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| AppError::Database(format!("Invalid project id '{}': {}", row.id, e)))?,
        name: row.name,
        description: row.description,
        owner_id,
        owner_username: row.owner_username,
        status: row.status,
        test_cases_count: row.test_cases_count,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

/// Insert a new project. Derived fields on the record are ignored.
pub fn insert_project(conn: &Connection, project: &Project) -> AppResult<()> {
    conn.execute(
        "INSERT INTO projects (id, name, description, owner_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            project.id.to_string(),
            project.name.as_str(),
            project.description.as_deref(),
            project.owner_id.map(|id| id.to_string()),
            project.status.as_str(),
            project.created_at.to_rfc3339(),
            project.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to insert project: {}", e)))?;

    Ok(())
}

/// Get a project by ID with hydrated display fields.
pub fn get_project_by_id(conn: &Connection, id: Uuid) -> AppResult<Option<Project>> {
    let sql = format!("{} WHERE p.id = ?1", PROJECT_SELECT);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let result = stmt.query_row(params![id.to_string()], read_project_row);

    match result {
        Ok(row) => Ok(Some(row_to_project(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}

/// List all projects, newest first.
pub fn list_projects(conn: &Connection) -> AppResult<Vec<Project>> {
    let sql = format!("{} ORDER BY p.created_at DESC", PROJECT_SELECT);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map([], read_project_row)
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_project).collect()
}

/// List the projects owned by a user, newest first.
pub fn list_projects_by_owner(conn: &Connection, owner_id: Uuid) -> AppResult<Vec<Project>> {
    let sql = format!(
        "{} WHERE p.owner_id = ?1 ORDER BY p.created_at DESC",
        PROJECT_SELECT
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = stmt
        .query_map(params![owner_id.to_string()], read_project_row)
        .map_err(|e| AppError::Database(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))?;

    rows.into_iter().map(row_to_project).collect()
}

/// Write the mutable fields of a project back to its row.
pub fn update_project(conn: &Connection, project: &Project) -> AppResult<()> {
    conn.execute(
        "UPDATE projects SET name = ?1, description = ?2, status = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            project.name.as_str(),
            project.description.as_deref(),
            project.status.as_str(),
            project.updated_at.to_rfc3339(),
            project.id.to_string(),
        ],
    )
    .map_err(|e| AppError::Database(format!("Failed to update project: {}", e)))?;

    Ok(())
}

/// Delete a project. Its test cases cascade at the schema level.
pub fn delete_project(conn: &Connection, id: Uuid) -> AppResult<()> {
    conn.execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])
        .map_err(|e| AppError::Database(format!("Failed to delete project: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrations, users, DbPool};
    use crate::models::project::DEFAULT_PROJECT_STATUS;
    use crate::models::User;
    use chrono::Utc;

    fn test_pool() -> DbPool {
        let pool = DbPool::open_in_memory().unwrap();
        migrations::run_migrations(&pool).unwrap();
        pool
    }

    fn new_project(name: &str, owner_id: Option<Uuid>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            owner_id,
            owner_username: None,
            status: DEFAULT_PROJECT_STATUS.to_string(),
            test_cases_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_hydrate_owner_username() {
        let pool = test_pool();
        let conn = pool.connection();

        let owner = User::new("owner", "owner@example.com", "secret1", None).unwrap();
        users::insert_user(&conn, &owner).unwrap();

        let project = new_project("Checkout", Some(owner.id));
        insert_project(&conn, &project).unwrap();

        let found = get_project_by_id(&conn, project.id).unwrap().unwrap();
        assert_eq!(found.name, "Checkout");
        assert_eq!(found.owner_username.as_deref(), Some("owner"));
        assert_eq!(found.test_cases_count, 0);
    }

    #[test]
    fn test_ownerless_project_reads_back() {
        let pool = test_pool();
        let conn = pool.connection();

        let project = new_project("Orphan", None);
        insert_project(&conn, &project).unwrap();

        let found = get_project_by_id(&conn, project.id).unwrap().unwrap();
        assert!(found.owner_id.is_none());
        assert!(found.owner_username.is_none());
    }

    #[test]
    fn test_list_by_owner_filters() {
        let pool = test_pool();
        let conn = pool.connection();

        let a = User::new("usera", "a@example.com", "secret1", None).unwrap();
        let b = User::new("userb", "b@example.com", "secret1", None).unwrap();
        users::insert_user(&conn, &a).unwrap();
        users::insert_user(&conn, &b).unwrap();

        insert_project(&conn, &new_project("A1", Some(a.id))).unwrap();
        insert_project(&conn, &new_project("A2", Some(a.id))).unwrap();
        insert_project(&conn, &new_project("B1", Some(b.id))).unwrap();

        let owned = list_projects_by_owner(&conn, a.id).unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|p| p.owner_id == Some(a.id)));
    }

    #[test]
    fn test_update_and_delete() {
        let pool = test_pool();
        let conn = pool.connection();

        let mut project = new_project("Before", None);
        insert_project(&conn, &project).unwrap();

        project.name = "After".to_string();
        project.description = Some("now described".to_string());
        project.status = "archived".to_string();
        project.updated_at = Utc::now();
        update_project(&conn, &project).unwrap();

        let found = get_project_by_id(&conn, project.id).unwrap().unwrap();
        assert_eq!(found.name, "After");
        assert_eq!(found.description.as_deref(), Some("now described"));
        assert_eq!(found.status, "archived");

        delete_project(&conn, project.id).unwrap();
        assert!(get_project_by_id(&conn, project.id).unwrap().is_none());
    }
}
