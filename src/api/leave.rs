use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::access::{Action, authorize};
use crate::api::{success, success_with};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{
    self, DurationUnit, LeaveChanges, LeaveDetail, LeaveType, NewLeave,
};
use crate::validation::{
    compute_duration, parse_date, require_fields, sanitize_text, validate_date_range,
    validate_reason, validate_rejection_reason,
};

/// Create/update payload. Everything arrives as optional text so required
/// fields can be reported together; `duration` is never accepted from the
/// client.
#[derive(Deserialize, ToSchema)]
pub struct LeaveInput {
    #[schema(example = "sick")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: Option<String>,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: Option<String>,
    #[schema(example = "days")]
    /// Defaults to "days" when omitted
    pub duration_unit: Option<String>,
    #[schema(example = "Recovering from a minor surgery")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApproveInput {
    pub admin_comment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectInput {
    #[schema(example = "Team is at minimum staffing that week")]
    pub rejected_reason: Option<String>,
    pub admin_comment: Option<String>,
}

#[derive(Debug)]
struct ValidatedLeave {
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration: f64,
    duration_unit: DurationUnit,
    reason: String,
}

/// Shared by create and update: both run the full validation gauntlet, in
/// the same order, against the same rules.
fn validate_leave_input(input: &LeaveInput, today: NaiveDate) -> Result<ValidatedLeave, ApiError> {
    require_fields(&[
        ("leave_type", input.leave_type.as_deref()),
        ("start_date", input.start_date.as_deref()),
        ("end_date", input.end_date.as_deref()),
        ("reason", input.reason.as_deref()),
    ])
    .map_err(ApiError::Validation)?;

    let leave_type = input
        .leave_type
        .as_deref()
        .unwrap_or("")
        .trim()
        .parse::<LeaveType>()
        .map_err(|_| ApiError::Validation("Invalid leave type".to_string()))?;

    let start_date = parse_date(input.start_date.as_deref().unwrap_or(""))
        .ok_or_else(|| ApiError::Validation("Invalid start_date, expected YYYY-MM-DD".to_string()))?;
    let end_date = parse_date(input.end_date.as_deref().unwrap_or(""))
        .ok_or_else(|| ApiError::Validation("Invalid end_date, expected YYYY-MM-DD".to_string()))?;

    validate_date_range(start_date, end_date, today)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let reason = sanitize_text(input.reason.as_deref().unwrap_or(""));
    validate_reason(&reason).map_err(|e| ApiError::Validation(e.to_string()))?;

    let duration_unit = match input.duration_unit.as_deref() {
        Some(u) => u
            .trim()
            .parse::<DurationUnit>()
            .map_err(|_| ApiError::Validation("Invalid duration unit".to_string()))?,
        None => DurationUnit::Days,
    };

    let duration = compute_duration(start_date, end_date, duration_unit);

    Ok(ValidatedLeave {
        leave_type,
        start_date,
        end_date,
        duration,
        duration_unit,
        reason,
    })
}

async fn load_detail(pool: &MySqlPool, leave_id: u64) -> Result<LeaveDetail, ApiError> {
    leave::find_by_id(pool, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            ApiError::internal()
        })?
        .map(LeaveDetail::from)
        .ok_or_else(|| ApiError::NotFound("Leave request not found".to_string()))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = LeaveInput,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave application submitted", body = Object, example = json!({
            "data": { "id": 1, "status": "pending", "duration": 3.0 },
            "message": "Leave application submitted successfully"
        })),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveInput>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::CreateLeave)?;

    let v = validate_leave_input(&payload, Utc::now().date_naive())?;

    let leave_id = leave::insert(
        pool.get_ref(),
        &NewLeave {
            employee_id: auth.user_id,
            leave_type: v.leave_type,
            start_date: v.start_date,
            end_date: v.end_date,
            duration: v.duration,
            duration_unit: v.duration_unit,
            reason: v.reason,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = auth.user_id, "Failed to create leave request");
        ApiError::internal()
    })?;

    let detail = load_detail(pool.get_ref(), leave_id).await?;

    Ok(success_with(
        &detail,
        "Leave application submitted successfully",
    ))
}

/* =========================
Own / global listings
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/my-leaves",
    responses(
        (status = 200, description = "Caller's leave requests, newest first", body = [LeaveDetail]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ViewOwnLeaves)?;

    let leaves = leave::list_by_employee(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = auth.user_id, "Failed to fetch own leaves");
            ApiError::internal()
        })?;

    let details: Vec<LeaveDetail> = leaves.into_iter().map(LeaveDetail::from).collect();
    Ok(success(&details))
}

#[utoipa::path(
    get,
    path = "/api/leaves/all",
    responses(
        (status = 200, description = "Every leave request, newest first", body = [LeaveDetail]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn all_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ViewAllLeaves)?;

    let leaves = leave::list_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave list");
        ApiError::internal()
    })?;

    let details: Vec<LeaveDetail> = leaves.into_iter().map(LeaveDetail::from).collect();
    Ok(success(&details))
}

#[utoipa::path(
    get,
    path = "/api/leaves/today",
    responses(
        (status = 200, description = "Approved leaves spanning today, by start date", body = [LeaveDetail]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn today_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ViewTodayLeaves)?;
    active_listing(pool.get_ref()).await
}

#[utoipa::path(
    get,
    path = "/api/leaves/active",
    responses(
        (status = 200, description = "Currently active approved leaves", body = [LeaveDetail]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn active_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ViewTodayLeaves)?;
    active_listing(pool.get_ref()).await
}

/// /today and /active are distinct routes over one query.
async fn active_listing(pool: &MySqlPool) -> Result<HttpResponse, ApiError> {
    let leaves = leave::find_active_on(pool, Utc::now().date_naive())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch today's leaves");
            ApiError::internal()
        })?;

    let details: Vec<LeaveDetail> = leaves.into_iter().map(LeaveDetail::from).collect();
    Ok(success(&details))
}

/* =========================
Get by id
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner and not HR"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let detail = load_detail(pool.get_ref(), leave_id).await?;
    authorize(
        Some(&auth),
        Action::ViewLeave {
            owner: detail.employee_id,
        },
    )?;

    Ok(success(&detail))
}

/* =========================
Approve leave (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ApproveInput, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved", body = LeaveDetail),
        (status = 400, description = "Already processed", body = Object, example = json!({
            "message": "Leave request already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: Option<web::Json<ApproveInput>>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ApproveLeave)?;

    let leave_id = path.into_inner();
    let admin_comment = body
        .as_ref()
        .and_then(|b| b.admin_comment.as_deref())
        .map(sanitize_text)
        .filter(|c| !c.is_empty());

    let rows = leave::approve(pool.get_ref(), leave_id, auth.user_id, admin_comment.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Approve leave failed");
            ApiError::internal()
        })?;

    if rows == 0 {
        // The conditional update said no; a single re-read tells us why.
        return Err(already_processed_or_missing(pool.get_ref(), leave_id).await?);
    }

    let detail = load_detail(pool.get_ref(), leave_id).await?;
    Ok(success_with(&detail, "Leave request approved successfully"))
}

/* =========================
Reject leave (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = RejectInput, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveDetail),
        (status = 400, description = "Bad rejection reason or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<RejectInput>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::RejectLeave)?;

    let leave_id = path.into_inner();

    let rejected_reason = sanitize_text(body.rejected_reason.as_deref().unwrap_or(""));
    validate_rejection_reason(&rejected_reason)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let admin_comment = body
        .admin_comment
        .as_deref()
        .map(sanitize_text)
        .filter(|c| !c.is_empty());

    let rows = leave::reject(
        pool.get_ref(),
        leave_id,
        auth.user_id,
        &rejected_reason,
        admin_comment.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        ApiError::internal()
    })?;

    if rows == 0 {
        return Err(already_processed_or_missing(pool.get_ref(), leave_id).await?);
    }

    let detail = load_detail(pool.get_ref(), leave_id).await?;
    Ok(success_with(&detail, "Leave request rejected successfully"))
}

/// Zero rows from a conditional transition means either the id never existed
/// or someone else already processed it; only a read can tell the two apart.
async fn already_processed_or_missing(
    pool: &MySqlPool,
    leave_id: u64,
) -> Result<ApiError, ApiError> {
    let row = leave::find_by_id(pool, leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        ApiError::internal()
    })?;

    Ok(match row {
        Some(_) => ApiError::Conflict("Leave request already processed".to_string()),
        None => ApiError::NotFound("Leave request not found".to_string()),
    })
}

/* =========================
Update leave (owner, pending only)
========================= */
#[utoipa::path(
    put,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to update")
    ),
    request_body(content = LeaveInput, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave updated", body = LeaveDetail),
        (status = 400, description = "Validation failed or not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<LeaveInput>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let existing = load_detail(pool.get_ref(), leave_id).await?;
    authorize(
        Some(&auth),
        Action::EditLeave {
            owner: existing.employee_id,
            status: existing.status,
        },
    )?;

    let v = validate_leave_input(&payload, Utc::now().date_naive())?;

    let rows = leave::update_owned(
        pool.get_ref(),
        leave_id,
        auth.user_id,
        &LeaveChanges {
            leave_type: v.leave_type,
            start_date: v.start_date,
            end_date: v.end_date,
            duration: v.duration,
            duration_unit: v.duration_unit,
            reason: v.reason,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Update leave failed");
        ApiError::internal()
    })?;

    if rows == 0 {
        return Err(ApiError::Validation(
            "Failed to update leave request".to_string(),
        ));
    }

    let detail = load_detail(pool.get_ref(), leave_id).await?;
    Ok(success_with(&detail, "Leave request updated successfully"))
}

/* =========================
Cancel leave (owner, pending only)
========================= */
#[utoipa::path(
    delete,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = Object, example = json!({
            "data": [],
            "message": "Leave request cancelled successfully"
        })),
        (status = 400, description = "Not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let existing = load_detail(pool.get_ref(), leave_id).await?;
    authorize(
        Some(&auth),
        Action::CancelLeave {
            owner: existing.employee_id,
            status: existing.status,
        },
    )?;

    let rows = leave::delete_pending(pool.get_ref(), leave_id, auth.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Cancel leave failed");
            ApiError::internal()
        })?;

    if rows == 0 {
        return Err(ApiError::Validation(
            "Failed to cancel leave request".to_string(),
        ));
    }

    Ok(success_with(&json!([]), "Leave request cancelled successfully"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn input(reason: &str) -> LeaveInput {
        LeaveInput {
            leave_type: Some("vacation".to_string()),
            start_date: Some("2024-06-10".to_string()),
            end_date: Some("2024-06-12".to_string()),
            duration_unit: None,
            reason: Some(reason.to_string()),
        }
    }

    #[test]
    fn nine_character_reason_fails_ten_passes() {
        let err = validate_leave_input(&input("too short"), today()).unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation("Reason must be at least 10 characters".to_string())
        );

        let ok = validate_leave_input(&input("exactly 10"), today()).unwrap();
        assert_eq!(ok.reason, "exactly 10");
    }

    #[test]
    fn duration_defaults_to_inclusive_days() {
        let v = validate_leave_input(&input("Family trip abroad"), today()).unwrap();
        assert_eq!(v.duration_unit, DurationUnit::Days);
        assert_eq!(v.duration, 3.0);
    }

    #[test]
    fn hour_unit_uses_elapsed_time() {
        let mut i = input("Medical appointment run");
        i.duration_unit = Some("hours".to_string());
        let v = validate_leave_input(&i, today()).unwrap();
        assert_eq!(v.duration, 48.0);
    }

    #[test]
    fn unknown_unit_and_type_are_rejected() {
        let mut i = input("A perfectly fine reason");
        i.duration_unit = Some("weeks".to_string());
        assert_eq!(
            validate_leave_input(&i, today()).unwrap_err(),
            ApiError::Validation("Invalid duration unit".to_string())
        );

        let mut i = input("A perfectly fine reason");
        i.leave_type = Some("annual".to_string());
        assert_eq!(
            validate_leave_input(&i, today()).unwrap_err(),
            ApiError::Validation("Invalid leave type".to_string())
        );
    }

    #[test]
    fn missing_fields_come_back_in_one_message() {
        let i = LeaveInput {
            leave_type: None,
            start_date: Some("2024-06-10".to_string()),
            end_date: None,
            duration_unit: None,
            reason: Some("  ".to_string()),
        };
        assert_eq!(
            validate_leave_input(&i, today()).unwrap_err(),
            ApiError::Validation(
                "Leave_type is required, End_date is required, Reason is required".to_string()
            )
        );
    }

    #[test]
    fn past_start_date_is_rejected() {
        let mut i = input("Back-dated vacation try");
        i.start_date = Some("2024-05-20".to_string());
        assert_eq!(
            validate_leave_input(&i, today()).unwrap_err(),
            ApiError::Validation("Cannot apply for leave in the past".to_string())
        );
    }

    #[test]
    fn reason_is_sanitized_before_storage() {
        let v = validate_leave_input(&input("sick <b>again</b> today"), today()).unwrap();
        assert_eq!(v.reason, "sick &lt;b&gt;again&lt;/b&gt; today");
    }
}
