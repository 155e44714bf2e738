use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::models::TokenType;

/// The resolved caller, extracted from a bearer access token. Handlers take
/// this by value; authorization decisions go through `access::authorize`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => {
                return ready(Err(
                    ApiError::Unauthenticated("Access token required".to_string()).into(),
                ));
            }
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    ApiError::Internal("Config missing".to_string()).into()
                ));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => {
                return ready(Err(ApiError::Unauthenticated(
                    "Invalid or expired token".to_string(),
                )
                .into()));
            }
        };

        // Refresh tokens only mint new tokens; they never open API routes.
        if claims.token_type != TokenType::Access {
            return ready(Err(ApiError::Unauthenticated(
                "Invalid or expired token".to_string(),
            )
            .into()));
        }

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        }))
    }
}
