use axum::http::{header::AUTHORIZATION, HeaderMap};
use uuid::Uuid;

use super::jwt::verify_user_jwt;

/// Identity carried by a verified bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: Uuid,
}

/// Extract the token of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verify the request's bearer token
///
/// The role claim is not trusted here; callers load the user to get the
/// current role.
pub fn resolve_user_identity(headers: &HeaderMap, secret: &str) -> Result<UserIdentity, String> {
    let token = bearer_token(headers).ok_or_else(|| "Authentication required".to_string())?;
    let claims = verify_user_jwt(token, secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| "Invalid access token: malformed subject".to_string())?;
    Ok(UserIdentity { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_user_jwt;
    use axum::http::HeaderValue;
    use pm_core::user::UserRole;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer   abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_resolve_identity() {
        let user_id = Uuid::new_v4();
        let (token, _) = issue_user_jwt(user_id, UserRole::Member, "secret", 1).unwrap();

        let identity = resolve_user_identity(&headers(&format!("Bearer {}", token)), "secret").unwrap();
        assert_eq!(identity.user_id, user_id);
        assert!(resolve_user_identity(&HeaderMap::new(), "secret").is_err());
        assert!(resolve_user_identity(&headers("Bearer junk"), "secret").is_err());
    }
}
