use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::repo::{StoreError, UserStore};
use super::repo_types::User;

/// Process-local store used by router tests; mirrors the unique-email constraint of `users`.
#[derive(Default)]
pub struct InMemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == email) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: rows.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError> {
        if let Some(u) = self.rows.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(email) = email {
            if rows.iter().any(|u| u.email == email && u.id != id) {
                return Err(StoreError::Duplicate);
            }
        }
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.rows.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}
