/// Authentication Routes
///
/// Registration, login, token refresh, logout and current user information.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, Claims};
use crate::error::{AppError, OperationContext};
use crate::logger::RequestId;
use crate::routes::users::UserResponse;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
    pub email: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/register
///
/// # Errors
/// - 400: invalid email, username or password
/// - 409: email or username already taken
pub async fn register(
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
    request_id: Option<web::ReqData<RequestId>>,
) -> Result<HttpResponse, AppError> {
    let ctx = OperationContext::new("user_registration", request_id.as_deref());

    let user = auth
        .register(&form.email, &form.username, &form.password)
        .await
        .map_err(|e| {
            ctx.log_error(&e);
            e
        })?;

    tracing::info!(request_id = %ctx.request_id, user_id = user.id, "User registered successfully");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user_id: user.id,
        email: user.email,
        username: user.username,
    }))
}

/// POST /auth/login
///
/// Unknown email and wrong password both answer 401 with the same body.
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
    request_id: Option<web::ReqData<RequestId>>,
) -> Result<HttpResponse, AppError> {
    let ctx = OperationContext::new("user_login", request_id.as_deref());

    let user = match auth.authenticate(&form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            ctx.log_error(&e);
            return Err(e);
        }
    };

    let pair = auth.issue_token_pair(&user)?;

    tracing::info!(request_id = %ctx.request_id, user_id = user.id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: pair.token_type.to_string(),
        user_id: user.id,
        email: user.email,
    }))
}

/// POST /auth/refresh
///
/// # Errors
/// - 401: invalid, expired or non-refresh token, or the user no longer exists
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
    request_id: Option<web::ReqData<RequestId>>,
) -> Result<HttpResponse, AppError> {
    let ctx = OperationContext::new("token_refresh", request_id.as_deref());

    let pair = auth.refresh(&form.refresh_token).await.map_err(|e| {
        ctx.log_error(&e);
        e
    })?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: pair.token_type.to_string(),
        expires_in: pair.expires_in,
    }))
}

/// POST /auth/logout
///
/// **Requires a valid access token.** Tokens are not tracked server-side;
/// the client discards them.
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully logged out. Please delete tokens on client side."
    }))
}

/// GET /auth/me
///
/// **Requires a valid access token**; claims are injected by `JwtMiddleware`.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = auth.current_user(&claims).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
