use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{claims::TokenKind, jwt::JwtKeys};
use crate::{error::AppError, state::AppState, users::repo::UserStore, users::repo_types::User};

/// The user resolved from the request's bearer token. Re-read from the store on every request.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts);
        let user = authenticate(&state.keys, state.users.as_ref(), token).await?;
        Ok(CurrentUser(user))
    }
}

/// Reads `Authorization: Bearer <token>`; any other shape counts as no token.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Maps a bearer token to a live user. Every failure is the same `AppError::Unauthorized`.
pub async fn authenticate(
    keys: &JwtKeys,
    users: &dyn UserStore,
    token: Option<&str>,
) -> Result<User, AppError> {
    let Some(token) = token else {
        warn!("missing bearer token");
        return Err(AppError::Unauthorized);
    };

    let claims = keys.verify_kind(token, TokenKind::Access).map_err(|reason| {
        warn!(%reason, "bearer token rejected");
        AppError::Unauthorized
    })?;

    match users.find_by_email(&claims.sub).await? {
        Some(user) => Ok(user),
        None => {
            warn!("token subject no longer exists");
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::test_keys, password::hash_password};
    use crate::users::memory::InMemoryUserStore;
    use axum::http::Request;
    use time::Duration;

    async fn store_with_ana() -> InMemoryUserStore {
        let store = InMemoryUserStore::default();
        let hash = hash_password("Secret123!").unwrap();
        store.create("Ana", "ana@x.com", &hash).await.unwrap();
        store
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/me");
        if let Some(h) = header {
            req = req.header(AUTHORIZATION, h);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("token_invalido"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[tokio::test]
    async fn resolves_user_for_valid_token() {
        let keys = test_keys("dev-secret");
        let store = store_with_ana().await;
        let token = keys.issue_access("ana@x.com").unwrap();
        let user = authenticate(&keys, &store, Some(&token)).await.unwrap();
        assert_eq!(user.email, "ana@x.com");
    }

    #[tokio::test]
    async fn every_rejection_is_unauthorized() {
        let keys = test_keys("dev-secret");
        let store = store_with_ana().await;

        let expired = keys
            .issue("ana@x.com", TokenKind::Access, Duration::seconds(-5))
            .unwrap();
        let foreign = test_keys("other-secret").issue_access("ana@x.com").unwrap();
        let reset = keys.issue_reset("ana@x.com").unwrap();
        let ghost = keys.issue_access("ghost@x.com").unwrap();

        for token in [None, Some("token_invalido"), Some(&expired[..]), Some(&foreign[..]), Some(&reset[..]), Some(&ghost[..])] {
            let err = authenticate(&keys, &store, token).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized), "token {token:?}");
        }
    }

    #[tokio::test]
    async fn deleted_user_is_rejected_with_still_valid_token() {
        let keys = test_keys("dev-secret");
        let store = store_with_ana().await;
        let token = keys.issue_access("ana@x.com").unwrap();
        let user = authenticate(&keys, &store, Some(&token)).await.unwrap();

        store.delete(user.id).await.unwrap();

        assert!(keys.verify(&token).is_ok());
        let err = authenticate(&keys, &store, Some(&token)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
