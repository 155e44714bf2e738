use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored as a string in the `users.role` column and embedded in JWT claims.
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
pub enum Role {
    Employee,
    Hr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_db_strings() {
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!("hr".parse::<Role>().unwrap(), Role::Hr);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Hr).unwrap(), "\"hr\"");
        assert_eq!(Role::Employee.to_string(), "employee");
    }
}
