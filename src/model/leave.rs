use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Vacation,
    Personal,
    Emergency,
    Other,
}

/// pending -> {approved | rejected}; both review outcomes are terminal.
/// The transition itself is enforced by the conditional UPDATEs below.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DurationUnit {
    Days,
    Hours,
}

/// Fully validated insert payload. `duration` is the server-computed value.
#[derive(Debug)]
pub struct NewLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: f64,
    pub duration_unit: DurationUnit,
    pub reason: String,
}

/// Owner edit payload; re-validated exactly like a create before it gets here.
#[derive(Debug)]
pub struct LeaveChanges {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: f64,
    pub duration_unit: DurationUnit,
    pub reason: String,
}

/// One row of the denormalized leave view: the leave itself joined with the
/// owning employee's identity and, when reviewed, the reviewer's.
#[derive(Debug, FromRow)]
pub struct LeaveJoinRow {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: f64,
    pub duration_unit: DurationUnit,
    pub reason: String,
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
    pub rejected_reason: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub user_employee_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub reviewed_by_name: Option<String>,
    pub reviewed_by_email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeInfo {
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Company employee code, not the numeric user id.
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewerInfo {
    pub name: String,
    pub email: Option<String>,
}

/// Wire shape of a leave request everywhere one is returned.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveDetail {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub duration: f64,
    pub duration_unit: DurationUnit,
    pub reason: String,
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
    pub rejected_reason: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub applied_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub employee: EmployeeInfo,
    pub reviewed_by: Option<ReviewerInfo>,
}

impl From<LeaveJoinRow> for LeaveDetail {
    fn from(row: LeaveJoinRow) -> Self {
        LeaveDetail {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row.leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            duration: row.duration,
            duration_unit: row.duration_unit,
            reason: row.reason,
            status: row.status,
            admin_comment: row.admin_comment,
            rejected_reason: row.rejected_reason,
            applied_at: row.applied_at,
            reviewed_at: row.reviewed_at,
            employee: EmployeeInfo {
                id: row.employee_id,
                name: row.name,
                email: row.email,
                employee_id: row.user_employee_id,
                department: row.department,
                position: row.position,
            },
            reviewed_by: row.reviewed_by_name.map(|name| ReviewerInfo {
                name,
                email: row.reviewed_by_email,
            }),
        }
    }
}

const DETAIL_COLUMNS: &str = "l.id, l.employee_id, l.leave_type, l.start_date, l.end_date, \
     l.duration, l.duration_unit, l.reason, l.status, \
     l.admin_comment, l.rejected_reason, l.applied_at, l.reviewed_at, \
     u.name, u.email, u.employee_id AS user_employee_id, u.department, u.position, \
     r.name AS reviewed_by_name, r.email AS reviewed_by_email";

pub async fn insert(pool: &MySqlPool, leave: &NewLeave) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (employee_id, leave_type, start_date, end_date, duration, duration_unit, reason, status, applied_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(leave.employee_id)
    .bind(leave.leave_type)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(leave.duration)
    .bind(leave.duration_unit)
    .bind(&leave.reason)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn find_by_id(pool: &MySqlPool, id: u64) -> Result<Option<LeaveJoinRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS} \
         FROM leaves l \
         LEFT JOIN users u ON l.employee_id = u.id \
         LEFT JOIN users r ON l.reviewed_by = r.id \
         WHERE l.id = ?"
    );

    sqlx::query_as::<_, LeaveJoinRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_employee(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Vec<LeaveJoinRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS} \
         FROM leaves l \
         LEFT JOIN users u ON l.employee_id = u.id \
         LEFT JOIN users r ON l.reviewed_by = r.id \
         WHERE l.employee_id = ? \
         ORDER BY l.applied_at DESC"
    );

    sqlx::query_as::<_, LeaveJoinRow>(&sql)
        .bind(employee_id)
        .fetch_all(pool)
        .await
}

pub async fn list_all(pool: &MySqlPool) -> Result<Vec<LeaveJoinRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS} \
         FROM leaves l \
         LEFT JOIN users u ON l.employee_id = u.id \
         LEFT JOIN users r ON l.reviewed_by = r.id \
         ORDER BY l.applied_at DESC"
    );

    sqlx::query_as::<_, LeaveJoinRow>(&sql).fetch_all(pool).await
}

/// Approved leaves spanning `today`. Serves both the /today and /active
/// routes; the two call sites are conceptually different but the query is
/// one and the same.
pub async fn find_active_on(
    pool: &MySqlPool,
    today: NaiveDate,
) -> Result<Vec<LeaveJoinRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {DETAIL_COLUMNS} \
         FROM leaves l \
         JOIN users u ON l.employee_id = u.id \
         LEFT JOIN users r ON l.reviewed_by = r.id \
         WHERE l.status = 'approved' AND ? BETWEEN l.start_date AND l.end_date \
         ORDER BY l.start_date ASC"
    );

    sqlx::query_as::<_, LeaveJoinRow>(&sql)
        .bind(today)
        .fetch_all(pool)
        .await
}

/// Conditional transition: only a pending row is touched, so at most one of
/// two concurrent reviewers can win. Returns the number of rows matched.
pub async fn approve(
    pool: &MySqlPool,
    id: u64,
    reviewer_id: u64,
    admin_comment: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = 'approved', reviewed_by = ?, reviewed_at = ?, admin_comment = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(reviewer_id)
    .bind(Utc::now())
    .bind(admin_comment)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Same atomicity contract as [`approve`]; the rejection reason is validated
/// by the caller before this runs.
pub async fn reject(
    pool: &MySqlPool,
    id: u64,
    reviewer_id: u64,
    rejected_reason: &str,
    admin_comment: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = 'rejected', reviewed_by = ?, reviewed_at = ?, rejected_reason = ?, admin_comment = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(reviewer_id)
    .bind(Utc::now())
    .bind(rejected_reason)
    .bind(admin_comment)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Owner-scoped update. The handler pre-checks ownership and pending status
/// for a precise message; the owner filter here is defense in depth.
pub async fn update_owned(
    pool: &MySqlPool,
    id: u64,
    employee_id: u64,
    changes: &LeaveChanges,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET leave_type = ?, start_date = ?, end_date = ?, duration = ?, duration_unit = ?, reason = ?
        WHERE id = ? AND employee_id = ?
        "#,
    )
    .bind(changes.leave_type)
    .bind(changes.start_date)
    .bind(changes.end_date)
    .bind(changes.duration)
    .bind(changes.duration_unit)
    .bind(&changes.reason)
    .bind(id)
    .bind(employee_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Cancellation is the only delete path: owner + pending, enforced in the
/// statement itself.
pub async fn delete_pending(
    pool: &MySqlPool,
    id: u64,
    employee_id: u64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM leaves
        WHERE id = ? AND employee_id = ? AND status = 'pending'
        "#,
    )
    .bind(id)
    .bind(employee_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn leave_type_parses_only_known_values() {
        assert_eq!("sick".parse::<LeaveType>().unwrap(), LeaveType::Sick);
        assert_eq!(
            "emergency".parse::<LeaveType>().unwrap(),
            LeaveType::Emergency
        );
        assert!("annual".parse::<LeaveType>().is_err());
        assert!("SICK".parse::<LeaveType>().is_err());
    }

    #[test]
    fn duration_unit_parses_only_known_values() {
        assert_eq!("days".parse::<DurationUnit>().unwrap(), DurationUnit::Days);
        assert_eq!("hours".parse::<DurationUnit>().unwrap(), DurationUnit::Hours);
        assert!("weeks".parse::<DurationUnit>().is_err());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<LeaveStatus>().unwrap(), status);
        }
    }

    fn join_row() -> LeaveJoinRow {
        LeaveJoinRow {
            id: 7,
            employee_id: 3,
            leave_type: LeaveType::Vacation,
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 5).unwrap(),
            duration: 5.0,
            duration_unit: DurationUnit::Days,
            reason: "Summer trip with family".to_string(),
            status: LeaveStatus::Pending,
            admin_comment: None,
            rejected_reason: None,
            applied_at: None,
            reviewed_at: None,
            name: Some("Jane Doe".to_string()),
            email: Some("jane@company.com".to_string()),
            user_employee_id: Some("EMP042".to_string()),
            department: Some("Engineering".to_string()),
            position: Some("Developer".to_string()),
            reviewed_by_name: None,
            reviewed_by_email: None,
        }
    }

    #[test]
    fn detail_nests_employee_identity() {
        let detail = LeaveDetail::from(join_row());
        assert_eq!(detail.employee.id, 3);
        assert_eq!(detail.employee.employee_id.as_deref(), Some("EMP042"));
        assert!(detail.reviewed_by.is_none());
    }

    #[test]
    fn detail_includes_reviewer_once_reviewed() {
        let mut row = join_row();
        row.status = LeaveStatus::Rejected;
        row.rejected_reason = Some("Coverage gap".to_string());
        row.reviewed_by_name = Some("HR Person".to_string());
        row.reviewed_by_email = Some("hr@company.com".to_string());

        let detail = LeaveDetail::from(row);
        let reviewer = detail.reviewed_by.expect("reviewer should be present");
        assert_eq!(reviewer.name, "HR Person");
        assert_eq!(reviewer.email.as_deref(), Some("hr@company.com"));
        assert_eq!(detail.rejected_reason.as_deref(), Some("Coverage gap"));
    }
}
