use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Registration payload. Fields stay optional so missing/blank ones can be
/// aggregated into a single "X is required" message.
#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    pub name: Option<String>,
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    /// Company employee code, e.g. "EMP042"
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub joining_date: Option<String>,
    /// Defaults to "employee" when omitted
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@company.com", format = "email", value_type = String)]
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Subject: the user's email.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
