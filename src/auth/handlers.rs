use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::api::success_with;
use crate::auth::auth::AuthUser;
use crate::auth::jwt::{generate_access_token, generate_refresh_token, verify_token};
use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::{self, NewUser, PublicUser};
use crate::models::{Claims, LoginReq, RegisterReq, TokenType};
use crate::utils::email_cache;
use crate::utils::email_filter;
use crate::validation::{
    MIN_PASSWORD_LEN, parse_date, require_fields, sanitize_text, validate_email,
};

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: u64,
    user_id: u64,
    revoked: bool,
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.to_lowercase();

    // 1) Cuckoo filter: a miss is a definite "never registered".
    if !email_filter::might_exist(&email) {
        return true;
    }

    // 2) Moka cache: fast positive for recently-seen registrations.
    if email_cache::is_taken(&email).await {
        return false;
    }

    // 3) Database fallback.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

async fn store_refresh_token(
    pool: &MySqlPool,
    user_id: u64,
    claims: &Claims,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(pool)
    .await?;

    Ok(())
}

fn token_pair(
    user: &PublicUser,
    config: &Config,
) -> (String, String, Claims) {
    let access_token = generate_access_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );
    (access_token, refresh_token, refresh_claims)
}

/* =========================
Register
========================= */
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    require_fields(&[
        ("name", payload.name.as_deref()),
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
        ("department", payload.department.as_deref()),
        ("position", payload.position.as_deref()),
        ("employee_id", payload.employee_id.as_deref()),
    ])
    .map_err(ApiError::Validation)?;

    // Free text is neutralized before it ever reaches the database.
    let name = sanitize_text(payload.name.as_deref().unwrap_or(""));
    let email = sanitize_text(payload.email.as_deref().unwrap_or(""));
    let department = sanitize_text(payload.department.as_deref().unwrap_or(""));
    let position = sanitize_text(payload.position.as_deref().unwrap_or(""));
    let employee_code = sanitize_text(payload.employee_id.as_deref().unwrap_or(""));
    let phone = payload
        .phone
        .as_deref()
        .map(sanitize_text)
        .filter(|p| !p.is_empty());
    let password = payload.password.as_deref().unwrap_or("");

    if !validate_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let role = match payload.role.as_deref() {
        Some(r) => r
            .trim()
            .parse::<Role>()
            .map_err(|_| ApiError::Validation("Invalid role".to_string()))?,
        None => Role::Employee,
    };

    let joining_date = match payload.joining_date.as_deref() {
        Some(raw) => parse_date(raw).ok_or_else(|| {
            ApiError::Validation("Invalid joining_date, expected YYYY-MM-DD".to_string())
        })?,
        None => Utc::now().date_naive(),
    };

    let duplicate_msg = "User with this email or employee ID already exists";

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::Conflict(duplicate_msg.to_string()));
    }

    let taken = user::exists(pool.get_ref(), &email, &employee_code)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to check existing users");
            ApiError::internal()
        })?;
    if taken {
        return Err(ApiError::Conflict(duplicate_msg.to_string()));
    }

    let new_user = NewUser {
        name,
        email: email.clone(),
        password_hash: hash_password(password),
        role,
        department,
        position,
        employee_id: employee_code,
        phone,
        joining_date,
    };

    let user_id = match user::insert(pool.get_ref(), &new_user).await {
        Ok(id) => id,
        Err(e) => {
            // The EXISTS pre-check races with concurrent registrations; the
            // unique indexes are the actual gate.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Err(ApiError::Conflict(duplicate_msg.to_string()));
                }
            }
            error!(error = %e, "Failed to register user");
            return Err(ApiError::internal());
        }
    };

    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    let user: PublicUser = user::find_by_id(pool.get_ref(), user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to load registered user");
            ApiError::internal()
        })?
        .ok_or_else(ApiError::internal)?
        .into();

    let (access_token, refresh_token, refresh_claims) = token_pair(&user, config.get_ref());
    store_refresh_token(pool.get_ref(), user.id, &refresh_claims)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to store refresh token");
            ApiError::internal()
        })?;

    info!(user_id, "User registered");

    Ok(success_with(
        &json!({
            "user": user,
            "access_token": access_token,
            "refresh_token": refresh_token,
        }),
        "User registered successfully",
    ))
}

/* =========================
Login
========================= */
#[instrument(name = "auth_login", skip_all)]
pub async fn login(
    payload: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    require_fields(&[
        ("email", payload.email.as_deref()),
        ("password", payload.password.as_deref()),
    ])
    .map_err(ApiError::Validation)?;

    let email = sanitize_text(payload.email.as_deref().unwrap_or(""));
    let password = payload.password.as_deref().unwrap_or("");

    if !validate_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    debug!("Fetching user");

    let db_user = user::find_by_email(pool.get_ref(), &email)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error while fetching user");
            ApiError::internal()
        })?
        .ok_or_else(|| {
            info!("Invalid credentials: user not found");
            ApiError::Validation("Invalid credentials".to_string())
        })?;

    if verify_password(password, &db_user.password).is_err() {
        info!(user_id = db_user.id, "Invalid credentials: password mismatch");
        return Err(ApiError::Validation("Invalid credentials".to_string()));
    }

    let user = PublicUser::from(db_user);
    let (access_token, refresh_token, refresh_claims) = token_pair(&user, config.get_ref());
    store_refresh_token(pool.get_ref(), user.id, &refresh_claims)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "Failed to store refresh token");
            ApiError::internal()
        })?;

    info!(user_id = user.id, "Login successful");

    Ok(success_with(
        &json!({
            "user": user,
            "access_token": access_token,
            "refresh_token": refresh_token,
        }),
        "Login successful",
    ))
}

/* =========================
Refresh
========================= */
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let invalid = || ApiError::Unauthenticated("Invalid or expired token".to_string());

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthenticated("Access token required".to_string()))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|_| invalid())?;

    if claims.token_type != TokenType::Refresh {
        return Err(invalid());
    }

    let record = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to look up refresh token");
        ApiError::internal()
    })?;

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return Err(invalid()),
    };

    // Rotate: the presented token is spent regardless of what follows.
    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(record.id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to revoke refresh token");
            ApiError::internal()
        })?;

    let (new_refresh_token, new_claims) = generate_refresh_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    );
    store_refresh_token(pool.get_ref(), record.user_id, &new_claims)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            ApiError::internal()
        })?;

    let access_token = generate_access_token(
        claims.user_id,
        claims.sub,
        claims.role,
        &config.jwt_secret,
        config.access_token_ttl,
    );

    Ok(HttpResponse::Ok().json(json!({
        "data": {
            "access_token": access_token,
            "refresh_token": new_refresh_token,
        }
    })))
}

/* =========================
Logout
========================= */
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    // Best-effort revocation: logout always succeeds, token or no token.
    if let Some(token) = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        if let Ok(claims) = verify_token(token, &config.jwt_secret) {
            if claims.token_type == TokenType::Refresh {
                let _ = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
                    .bind(&claims.jti)
                    .execute(pool.get_ref())
                    .await;
            }
        }
    }

    Ok(success_with(&json!([]), "Logged out successfully"))
}

/* =========================
Me
========================= */
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let user = user::find_by_id(pool.get_ref(), auth.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = auth.user_id, "Failed to load current user");
            ApiError::internal()
        })?
        .ok_or_else(|| ApiError::Unauthenticated("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "data": { "user": PublicUser::from(user) }
    })))
}
