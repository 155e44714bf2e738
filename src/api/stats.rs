use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::access::{Action, authorize};
use crate::api::success;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{self, LeaveDetail};
use crate::model::user::{self, AdminStats, PublicUser};

/// Admin dashboard payload: org-wide counters plus who is out today.
#[derive(Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub total_employees: i64,
    pub total_leaves: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub rejected_leaves: i64,
    pub today_leaves: i64,
    pub today_leaves_details: Vec<LeaveDetail>,
}

#[utoipa::path(
    get,
    path = "/api/users/stats",
    responses(
        (status = 200, description = "Caller's leave counters", body = Object, example = json!({
            "data": { "total_leaves": 4, "approved_leaves": 2, "pending_leaves": 1, "rejected_leaves": 1 }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn my_stats(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ViewOwnStats)?;

    let stats = user::leave_stats(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch user statistics");
            ApiError::internal()
        })?;

    Ok(success(&stats))
}

#[utoipa::path(
    get,
    path = "/api/users/admin-stats",
    responses(
        (status = 200, description = "Org-wide counters + today's active leaves", body = AdminStatsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn admin_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ViewAdminStats)?;

    let today = Utc::now().date_naive();

    let stats: AdminStats = user::admin_stats(pool.get_ref(), today).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch admin statistics");
        ApiError::internal()
    })?;

    let details = leave::find_active_on(pool.get_ref(), today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch today's leave details");
            ApiError::internal()
        })?;

    Ok(success(&AdminStatsResponse {
        total_employees: stats.total_employees,
        total_leaves: stats.total_leaves,
        pending_leaves: stats.pending_leaves,
        approved_leaves: stats.approved_leaves,
        rejected_leaves: stats.rejected_leaves,
        today_leaves: stats.today_leaves,
        today_leaves_details: details.into_iter().map(LeaveDetail::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/employees",
    responses(
        (status = 200, description = "Employee accounts, newest first", body = [PublicUser]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only")
    ),
    security(("bearer_auth" = [])),
    tag = "Stats"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    authorize(Some(&auth), Action::ListEmployees)?;

    let employees = user::list_employees(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch employees");
        ApiError::internal()
    })?;

    Ok(success(&employees))
}
