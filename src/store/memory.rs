use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{NewUser, User, UserStore};
use crate::error::DatabaseError;

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

/// Process-local store. The uniqueness check and the insert happen under one
/// write lock, so colliding concurrent registrations see exactly one winner.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "email already registered".to_string(),
            ));
        }
        if inner.users.values().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "username already registered".to_string(),
            ));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "salt$hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryUserStore::new();

        let first = store.create(new_user("a@example.com", "alice")).await.unwrap();
        let second = store.create(new_user("b@example.com", "bob")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@example.com", "alice")).await.unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_email("a@example.com").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(user));
        assert_eq!(store.find_by_email("nobody@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_username() {
        let store = InMemoryUserStore::new();
        store.create(new_user("a@example.com", "alice")).await.unwrap();

        let dup_email = store.create(new_user("a@example.com", "other")).await;
        assert!(matches!(dup_email, Err(DatabaseError::UniqueConstraintViolation(m)) if m.contains("email")));

        let dup_name = store.create(new_user("c@example.com", "alice")).await;
        assert!(matches!(dup_name, Err(DatabaseError::UniqueConstraintViolation(m)) if m.contains("username")));
    }

    #[tokio::test]
    async fn test_concurrent_colliding_registrations() {
        let store = Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .create(new_user("same@example.com", &format!("user{}", i)))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("a@example.com", "alice")).await.unwrap();

        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
