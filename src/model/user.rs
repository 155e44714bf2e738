use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Full row, password hash included. Never serialized; the wire shape is
/// [`PublicUser`].
#[derive(Debug, FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: Option<String>,
    pub position: Option<String>,
    pub employee_id: String,
    pub phone: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PublicUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub position: Option<String>,
    /// Company employee code.
    pub employee_id: String,
    pub phone: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub joining_date: Option<NaiveDate>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            department: user.department,
            position: user.position,
            employee_id: user.employee_id,
            phone: user.phone,
            joining_date: user.joining_date,
        }
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department: String,
    pub position: String,
    pub employee_id: String,
    pub phone: Option<String>,
    pub joining_date: NaiveDate,
}

/// Per-employee counters over their own leave records.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LeaveStats {
    pub total_leaves: i64,
    pub approved_leaves: i64,
    pub pending_leaves: i64,
    pub rejected_leaves: i64,
}

/// Org-wide counters; total_employees counts role=employee accounts only.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct AdminStats {
    pub total_employees: i64,
    pub total_leaves: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub rejected_leaves: i64,
    pub today_leaves: i64,
}

pub async fn insert(pool: &MySqlPool, user: &NewUser) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users
            (name, email, password, role, department, position, employee_id, phone, joining_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(&user.department)
    .bind(&user.position)
    .bind(&user.employee_id)
    .bind(user.phone.as_deref())
    .bind(user.joining_date)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn find_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, role, department, position, employee_id, phone, joining_date, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_id(pool: &MySqlPool, id: u64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, role, department, position, employee_id, phone, joining_date, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Duplicate check across both unique identities in one round trip.
pub async fn exists(
    pool: &MySqlPool,
    email: &str,
    employee_code: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? OR employee_id = ? LIMIT 1)",
    )
    .bind(email)
    .bind(employee_code)
    .fetch_one(pool)
    .await
}

pub async fn list_employees(pool: &MySqlPool) -> Result<Vec<PublicUser>, sqlx::Error> {
    sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT id, name, email, role, department, position, employee_id, phone, joining_date
        FROM users
        WHERE role = 'employee'
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn leave_stats(pool: &MySqlPool, user_id: u64) -> Result<LeaveStats, sqlx::Error> {
    // COUNT(CASE ...) keeps the counters BIGINT; SUM would come back DECIMAL.
    sqlx::query_as::<_, LeaveStats>(
        r#"
        SELECT
            COUNT(*) AS total_leaves,
            COUNT(CASE WHEN status = 'approved' THEN 1 END) AS approved_leaves,
            COUNT(CASE WHEN status = 'pending' THEN 1 END) AS pending_leaves,
            COUNT(CASE WHEN status = 'rejected' THEN 1 END) AS rejected_leaves
        FROM leaves
        WHERE employee_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Computed from current state at call time; nothing here is cached.
pub async fn admin_stats(pool: &MySqlPool, today: NaiveDate) -> Result<AdminStats, sqlx::Error> {
    sqlx::query_as::<_, AdminStats>(
        r#"
        SELECT
            COUNT(*) AS total_employees,
            (SELECT COUNT(*) FROM leaves) AS total_leaves,
            (SELECT COUNT(*) FROM leaves WHERE status = 'pending') AS pending_leaves,
            (SELECT COUNT(*) FROM leaves WHERE status = 'approved') AS approved_leaves,
            (SELECT COUNT(*) FROM leaves WHERE status = 'rejected') AS rejected_leaves,
            (SELECT COUNT(*) FROM leaves
             WHERE status = 'approved' AND ? BETWEEN start_date AND end_date) AS today_leaves
        FROM users
        WHERE role = 'employee'
        "#,
    )
    .bind(today)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn public_projection_never_carries_the_hash() {
        let user = User {
            id: 1,
            name: "Jane Doe".to_string(),
            email: "jane@company.com".to_string(),
            password: "$argon2id$...".to_string(),
            role: Role::Employee,
            department: Some("Engineering".to_string()),
            position: Some("Developer".to_string()),
            employee_id: "EMP042".to_string(),
            phone: None,
            joining_date: NaiveDate::from_ymd_opt(2023, 4, 1),
            created_at: None,
        };

        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["employee_id"], "EMP042");
        assert_eq!(json["role"], "employee");
    }
}
