use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::leave::{ApproveInput, LeaveInput, RejectInput};
use crate::api::stats::AdminStatsResponse;
use crate::model::leave::{
    DurationUnit, EmployeeInfo, LeaveDetail, LeaveStatus, LeaveType, ReviewerInfo,
};
use crate::model::role::Role;
use crate::model::user::{LeaveStats, PublicUser};
use crate::models::{LoginReq, RegisterReq};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management System API",
        version = "1.0.0",
        description = r#"
## Leave Management System (LMS)

This API powers a **Leave Management System**: employees apply for time off,
HR reviews the requests, and both sides track the outcome.

### 🔹 Key Features
- **Leave Lifecycle**
  - Apply, edit and cancel pending requests; HR approves or rejects
- **Access Control**
  - Owners see their own requests, HR sees everything
- **Statistics**
  - Per-employee counters and an org-wide HR dashboard

### 🔐 Security
Endpoints are protected using **JWT Bearer authentication** with refresh-token
rotation. Review actions and global views require the **HR** role.

### 📦 Response Format
- JSON envelopes: `{"data": ..., "message": ...}` on success, `{"message": ...}` on error

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::create_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::all_leaves,
        crate::api::leave::today_leaves,
        crate::api::leave::active_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::update_leave,
        crate::api::leave::cancel_leave,

        crate::api::stats::my_stats,
        crate::api::stats::admin_stats,
        crate::api::stats::list_employees
    ),
    components(
        schemas(
            LeaveInput,
            ApproveInput,
            RejectInput,
            LeaveDetail,
            EmployeeInfo,
            ReviewerInfo,
            LeaveType,
            LeaveStatus,
            DurationUnit,
            Role,
            PublicUser,
            LeaveStats,
            AdminStatsResponse,
            RegisterReq,
            LoginReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave lifecycle APIs"),
        (name = "Stats", description = "Statistics and employee listing APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
