/// User account routes. All of them sit behind `JwtMiddleware`.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::AuthService;
use crate::error::{AppError, DatabaseError};
use crate::routes::auth::RegisterRequest;
use crate::store::{User, UserStore};

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
}

/// GET /users
pub async fn list_users(store: web::Data<dyn UserStore>) -> Result<HttpResponse, AppError> {
    let users: Vec<UserListResponse> = store
        .list()
        .await?
        .into_iter()
        .map(|u| UserListResponse {
            id: u.id,
            email: u.email,
            username: u.username,
        })
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// POST /users
///
/// Same validation and hashing as registration.
pub async fn create_user(
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = auth
        .register(&form.email, &form.username, &form.password)
        .await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// GET /users/{id}
pub async fn get_user(
    path: web::Path<i64>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", user_id)))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    path: web::Path<i64>,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    if !store.delete(user_id).await? {
        return Err(DatabaseError::NotFound(format!("User {} not found", user_id)).into());
    }

    tracing::info!(user_id, "User deleted");
    Ok(HttpResponse::NoContent().finish())
}
