/// User store
///
/// The auth core only talks to persistence through `UserStore`. Adapters must
/// enforce email and username uniqueness themselves, atomically with the
/// insert, and report a collision as `DatabaseError::UniqueConstraintViolation`.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;

use crate::error::DatabaseError;

pub use memory::InMemoryUserStore;
pub use models::{NewUser, User};
pub use postgres::PostgresUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    /// Insert a user. Fails with `UniqueConstraintViolation` on a taken email or username.
    async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError>;

    async fn list(&self) -> Result<Vec<User>, DatabaseError>;

    /// Returns `false` when no user had this id.
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;
}
