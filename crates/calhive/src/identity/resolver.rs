use std::sync::Arc;

use axum::http::HeaderMap;

use calhive_core::calendar::User;
use calhive_core::storage::{RepositoryError, UserDirectory};
use calhive_core::OperationContext;

use super::{IdentityError, TokenClaims, TokenVerifier};

/// Header carrying the access token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Header carrying the ID token.
pub const ID_TOKEN_HEADER: &str = "x-id-token";

/// Turns request headers into a known [`User`].
pub struct IdentityResolver {
    verifier: TokenVerifier,
    users: Arc<dyn UserDirectory>,
}

impl IdentityResolver {
    pub fn new(verifier: TokenVerifier, users: Arc<dyn UserDirectory>) -> Self {
        Self { verifier, users }
    }

    /// Validates both bearer tokens and returns the ID token's user,
    /// registering them if this is their first request.
    pub async fn authenticate(
        &self,
        ctx: &OperationContext,
        headers: &HeaderMap,
    ) -> Result<User, IdentityError> {
        let access_token = bearer_token(headers, AUTHORIZATION_HEADER)?;
        self.verifier.verify(access_token)?;

        let id_token = bearer_token(headers, ID_TOKEN_HEADER)?;
        let claims = self.verifier.verify(id_token)?;

        self.resolve_or_create_user(ctx, &claims).await
    }

    /// Finds the user for `claims.sub`, creating them from the claims if
    /// absent. A concurrent first request for the same subject is resolved
    /// by reading back the row that won.
    pub async fn resolve_or_create_user(
        &self,
        ctx: &OperationContext,
        claims: &TokenClaims,
    ) -> Result<User, IdentityError> {
        if let Some(user) = self.users.find_by_user_id(ctx, &claims.sub).await? {
            return Ok(user);
        }

        let user = User::new(
            &claims.sub,
            claims.display_name(),
            claims.email.clone().unwrap_or_default(),
        );
        match self.users.create_user(ctx, &user).await {
            Ok(()) => Ok(user),
            Err(RepositoryError::AlreadyExists { .. }) => self
                .users
                .find_by_user_id(ctx, &claims.sub)
                .await?
                .ok_or_else(|| {
                    IdentityError::Directory(RepositoryError::NotFound {
                        entity_type: "User",
                        id: claims.sub.clone(),
                    })
                }),
            Err(err) => Err(err.into()),
        }
    }
}

fn bearer_token<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, IdentityError> {
    let value = headers
        .get(name)
        .ok_or(IdentityError::MissingHeader(name))?
        .to_str()
        .map_err(|_| IdentityError::MalformedHeader(name))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(IdentityError::MalformedHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryTable;
    use crate::stores::TableUserDirectory;
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(claims: &TokenClaims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str) -> TokenClaims {
        let mut claims = TokenClaims::new(sub);
        claims.exp = Some(chrono::Utc::now().timestamp() + 3600);
        claims
    }

    fn headers(access: &str, id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access}")).unwrap(),
        );
        headers.insert(
            ID_TOKEN_HEADER,
            HeaderValue::from_str(&format!("Bearer {id}")).unwrap(),
        );
        headers
    }

    fn resolver() -> (IdentityResolver, Arc<TableUserDirectory>) {
        let users = Arc::new(TableUserDirectory::new(Arc::new(InMemoryTable::new())));
        let resolver = IdentityResolver::new(TokenVerifier::new(Some(SECRET), None), users.clone());
        (resolver, users)
    }

    #[tokio::test]
    async fn test_first_request_registers_user() {
        let (resolver, users) = resolver();
        let ctx = OperationContext::background();
        let mut id_claims = claims("sub-1");
        id_claims.email = Some("alice@example.com".to_string());
        id_claims.name = Some("Alice".to_string());

        let user = resolver
            .authenticate(&ctx, &headers(&token(&claims("sub-1")), &token(&id_claims)))
            .await
            .unwrap();

        assert_eq!(user.user_id, "sub-1");
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(
            users.find_by_user_id(&ctx, "sub-1").await.unwrap(),
            Some(user)
        );
    }

    #[tokio::test]
    async fn test_known_user_is_returned_unchanged() {
        let (resolver, users) = resolver();
        let ctx = OperationContext::background();
        let existing = User::new("sub-1", "Original", "orig@example.com");
        users.create_user(&ctx, &existing).await.unwrap();

        let mut id_claims = claims("sub-1");
        id_claims.name = Some("Renamed".to_string());
        let user = resolver
            .authenticate(&ctx, &headers(&token(&claims("sub-1")), &token(&id_claims)))
            .await
            .unwrap();

        assert_eq!(user, existing);
    }

    #[tokio::test]
    async fn test_missing_headers_are_unauthorized() {
        let (resolver, _) = resolver();
        let ctx = OperationContext::background();

        let err = resolver
            .authenticate(&ctx, &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::MissingHeader(AUTHORIZATION_HEADER)));
        assert!(err.is_unauthorized());

        let mut only_access = HeaderMap::new();
        only_access.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token(&claims("sub-1")))).unwrap(),
        );
        let err = resolver.authenticate(&ctx, &only_access).await.unwrap_err();
        assert!(matches!(err, IdentityError::MissingHeader(ID_TOKEN_HEADER)));
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_malformed() {
        let (resolver, _) = resolver();
        let mut headers = headers(&token(&claims("sub-1")), &token(&claims("sub-1")));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        let err = resolver
            .authenticate(&OperationContext::background(), &headers)
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::MalformedHeader(AUTHORIZATION_HEADER)));
    }

    #[tokio::test]
    async fn test_invalid_id_token_is_unauthorized() {
        let (resolver, _) = resolver();

        let err = resolver
            .authenticate(
                &OperationContext::background(),
                &headers(&token(&claims("sub-1")), "garbage"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::InvalidToken(_)));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_directory_failure_is_not_unauthorized() {
        let (resolver, _) = resolver();
        let (ctx, handle) = OperationContext::with_cancel();
        handle.cancel();

        let err = resolver
            .authenticate(&ctx, &headers(&token(&claims("sub-1")), &token(&claims("sub-1"))))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IdentityError::Directory(RepositoryError::Cancelled)
        ));
        assert!(!err.is_unauthorized());
    }
}
