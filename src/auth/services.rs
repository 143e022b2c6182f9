use tracing::{info, warn};

use super::password::{hash_password, verify_password};
use crate::{
    error::AppError,
    users::repo::UserStore,
    users::repo_types::User,
};

pub const EMAIL_TAKEN: &str = "Email already registered";

/// Creates a user. A duplicate email is refused up front and, if a concurrent insert wins the race,
/// again by the store's unique constraint.
pub async fn register_user(
    users: &dyn UserStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    if users.find_by_email(email).await?.is_some() {
        warn!("registration with existing email");
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let hash = hash_password(password)?;
    let user = users
        .create(name, email, &hash)
        .await
        .map_err(|e| AppError::from_store(e, EMAIL_TAKEN))?;

    info!(user_id = user.id, "user registered");
    Ok(user)
}

/// Checks credentials without revealing which half was wrong.
pub async fn authenticate_credentials(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    match users.find_by_email(email).await? {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        Some(user) => {
            warn!(user_id = user.id, "login with wrong password");
            Err(AppError::InvalidCredentials)
        }
        None => {
            warn!("login for unknown email");
            Err(AppError::InvalidCredentials)
        }
    }
}

/// Replaces the stored hash. Outstanding access tokens stay valid until they expire.
pub async fn set_password(users: &dyn UserStore, user: &User, new_password: &str) -> Result<(), AppError> {
    let hash = hash_password(new_password)?;
    users.update_password(user.id, &hash).await?;
    info!(user_id = user.id, "password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{memory::InMemoryUserStore, repo::StoreError};
    use async_trait::async_trait;

    /// Loses the race: the lookup misses, then the unique constraint rejects the insert.
    #[derive(Default)]
    struct LateDuplicateStore {
        inner: InMemoryUserStore,
    }

    #[async_trait]
    impl UserStore for LateDuplicateStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, StoreError> {
            self.inner.create(name, email, password_hash).await
        }
        async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError> {
            self.inner.update_password(id, password_hash).await
        }
        async fn update_profile(
            &self,
            id: i64,
            name: Option<&str>,
            email: Option<&str>,
        ) -> Result<User, StoreError> {
            self.inner.update_profile(id, name, email).await
        }
        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn concurrent_duplicate_becomes_conflict() {
        let store = LateDuplicateStore::default();
        register_user(&store, "Ana", "ana@x.com", "Secret123!").await.unwrap();

        let err = register_user(&store, "Ana Two", "ana@x.com", "Other456!")
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, EMAIL_TAKEN),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(store.inner.count(), 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_alike() {
        let store = InMemoryUserStore::default();
        register_user(&store, "Ana", "ana@x.com", "Secret123!").await.unwrap();

        let wrong = authenticate_credentials(&store, "ana@x.com", "nope-nope").await;
        let unknown = authenticate_credentials(&store, "bob@x.com", "Secret123!").await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AppError::InvalidCredentials)));
        assert!(authenticate_credentials(&store, "ana@x.com", "Secret123!").await.is_ok());
    }
}
