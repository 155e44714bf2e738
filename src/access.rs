//! Central authorization. Every handler funnels its permission decision
//! through [`authorize`] instead of checking role strings inline, so the
//! rules live (and are tested) in one place.

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::LeaveStatus;
use crate::model::role::Role;

/// Owner-only mutations, distinguished only for error messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OwnedOp {
    Edit,
    Cancel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    ViewAllLeaves,
    ApproveLeave,
    RejectLeave,
    ViewAdminStats,
    ListEmployees,
    ViewLeave { owner: u64 },
    EditLeave { owner: u64, status: LeaveStatus },
    CancelLeave { owner: u64, status: LeaveStatus },
    ViewTodayLeaves,
    ViewOwnLeaves,
    CreateLeave,
    ViewOwnStats,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessError {
    Unauthenticated,
    AdminRequired,
    AccessDenied,
    NotOwner(OwnedOp),
    NotPending(OwnedOp),
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => {
                ApiError::Unauthenticated("Access token required".to_string())
            }
            AccessError::AdminRequired => ApiError::Forbidden("Admin access required".to_string()),
            AccessError::AccessDenied => ApiError::Forbidden("Access denied".to_string()),
            AccessError::NotOwner(OwnedOp::Edit) => {
                ApiError::Forbidden("You can only edit your own leave requests".to_string())
            }
            AccessError::NotOwner(OwnedOp::Cancel) => {
                ApiError::Forbidden("You can only cancel your own leave requests".to_string())
            }
            AccessError::NotPending(OwnedOp::Edit) => {
                ApiError::Conflict("Only pending leave requests can be edited".to_string())
            }
            AccessError::NotPending(OwnedOp::Cancel) => {
                ApiError::Conflict("Only pending leave requests can be cancelled".to_string())
            }
        }
    }
}

/// Rules in priority order: authentication, hr-only actions, per-record
/// visibility, owner-only mutations, then everything any authenticated
/// actor may do.
pub fn authorize(actor: Option<&AuthUser>, action: Action) -> Result<(), AccessError> {
    let actor = actor.ok_or(AccessError::Unauthenticated)?;

    match action {
        Action::ViewAllLeaves
        | Action::ApproveLeave
        | Action::RejectLeave
        | Action::ViewAdminStats
        | Action::ListEmployees => {
            if actor.role == Role::Hr {
                Ok(())
            } else {
                Err(AccessError::AdminRequired)
            }
        }
        Action::ViewLeave { owner } => {
            if actor.role == Role::Hr || owner == actor.user_id {
                Ok(())
            } else {
                Err(AccessError::AccessDenied)
            }
        }
        Action::EditLeave { owner, status } => {
            owned_mutation(actor, owner, status, OwnedOp::Edit)
        }
        Action::CancelLeave { owner, status } => {
            owned_mutation(actor, owner, status, OwnedOp::Cancel)
        }
        Action::ViewTodayLeaves
        | Action::ViewOwnLeaves
        | Action::CreateLeave
        | Action::ViewOwnStats => Ok(()),
    }
}

/// Edit/cancel never extend to hr: owner and pending, or nothing.
fn owned_mutation(
    actor: &AuthUser,
    owner: u64,
    status: LeaveStatus,
    op: OwnedOp,
) -> Result<(), AccessError> {
    if owner != actor.user_id {
        return Err(AccessError::NotOwner(op));
    }
    if status != LeaveStatus::Pending {
        return Err(AccessError::NotPending(op));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn employee(id: u64) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("user{id}@company.com"),
            role: Role::Employee,
        }
    }

    fn hr(id: u64) -> AuthUser {
        AuthUser {
            user_id: id,
            email: format!("hr{id}@company.com"),
            role: Role::Hr,
        }
    }

    #[rstest]
    #[case(Action::ViewAllLeaves)]
    #[case(Action::ApproveLeave)]
    #[case(Action::RejectLeave)]
    #[case(Action::ViewAdminStats)]
    #[case(Action::ListEmployees)]
    fn admin_actions_require_hr(#[case] action: Action) {
        assert_eq!(
            authorize(Some(&employee(1)), action),
            Err(AccessError::AdminRequired)
        );
        assert_eq!(authorize(Some(&hr(9)), action), Ok(()));
    }

    #[rstest]
    #[case(Action::ViewTodayLeaves)]
    #[case(Action::ViewOwnLeaves)]
    #[case(Action::CreateLeave)]
    #[case(Action::ViewOwnStats)]
    fn authenticated_actions_allow_any_role(#[case] action: Action) {
        assert_eq!(authorize(Some(&employee(1)), action), Ok(()));
        assert_eq!(authorize(Some(&hr(9)), action), Ok(()));
    }

    #[rstest]
    #[case(Action::ViewAllLeaves)]
    #[case(Action::CreateLeave)]
    #[case(Action::ViewLeave { owner: 1 })]
    fn nobody_gets_in_without_a_user(#[case] action: Action) {
        assert_eq!(authorize(None, action), Err(AccessError::Unauthenticated));
    }

    #[test]
    fn view_leave_allows_owner_and_hr_only() {
        let action = Action::ViewLeave { owner: 1 };
        assert_eq!(authorize(Some(&employee(1)), action), Ok(()));
        assert_eq!(authorize(Some(&hr(9)), action), Ok(()));
        assert_eq!(
            authorize(Some(&employee(2)), action),
            Err(AccessError::AccessDenied)
        );
    }

    #[test]
    fn edit_requires_owner_even_for_hr() {
        let action = Action::EditLeave {
            owner: 1,
            status: LeaveStatus::Pending,
        };
        assert_eq!(authorize(Some(&employee(1)), action), Ok(()));
        assert_eq!(
            authorize(Some(&hr(9)), action),
            Err(AccessError::NotOwner(OwnedOp::Edit))
        );
        assert_eq!(
            authorize(Some(&employee(2)), action),
            Err(AccessError::NotOwner(OwnedOp::Edit))
        );
    }

    #[rstest]
    #[case(LeaveStatus::Approved)]
    #[case(LeaveStatus::Rejected)]
    fn owner_cannot_touch_reviewed_requests(#[case] status: LeaveStatus) {
        assert_eq!(
            authorize(Some(&employee(1)), Action::EditLeave { owner: 1, status }),
            Err(AccessError::NotPending(OwnedOp::Edit))
        );
        assert_eq!(
            authorize(Some(&employee(1)), Action::CancelLeave { owner: 1, status }),
            Err(AccessError::NotPending(OwnedOp::Cancel))
        );
    }

    #[test]
    fn owner_mismatch_is_checked_before_status() {
        // A non-owner poking at a reviewed request sees 403, not the
        // pending-only conflict.
        assert_eq!(
            authorize(
                Some(&employee(2)),
                Action::CancelLeave {
                    owner: 1,
                    status: LeaveStatus::Approved,
                }
            ),
            Err(AccessError::NotOwner(OwnedOp::Cancel))
        );
    }

    #[test]
    fn http_mapping_distinguishes_forbidden_from_conflict() {
        let forbidden: ApiError = AccessError::NotOwner(OwnedOp::Edit).into();
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let conflict: ApiError = AccessError::NotPending(OwnedOp::Cancel).into();
        assert_eq!(conflict.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            conflict.to_string(),
            "Only pending leave requests can be cancelled"
        );

        let unauthenticated: ApiError = AccessError::Unauthenticated.into();
        assert_eq!(unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    }
}
