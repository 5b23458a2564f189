//! Verifiers for authorization requests.

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::context::AuthorizationRequestContext;
use crate::oauth::pkce::{PkceChallenge, PkceChallengeMethod};
use crate::oauth::verifier::RequestVerifier;
use crate::types::{Client, GrantType};

const AUTHORIZATION_CODE: &[GrantType] = &[GrantType::AuthorizationCode];

/// Checks run on every authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationVerifier {
    /// `response_type` must be `code`.
    ResponseType,
    /// The client exists, is active and may use the authorization code grant.
    ClientRegistered,
    /// The effective redirect URI is registered for the client.
    RedirectUri,
    /// Requested scopes are within the client's allowance.
    ScopeAllowed,
    /// The PKCE challenge is well formed; public clients must send one.
    PkceChallenge,
}

impl AuthorizationVerifier {
    /// Standard order: structural checks first.
    pub const STANDARD: [AuthorizationVerifier; 5] = [
        Self::ResponseType,
        Self::ClientRegistered,
        Self::RedirectUri,
        Self::ScopeAllowed,
        Self::PkceChallenge,
    ];
}

impl RequestVerifier<AuthorizationRequestContext> for AuthorizationVerifier {
    fn name(&self) -> &'static str {
        match self {
            Self::ResponseType => "response_type",
            Self::ClientRegistered => "client_registered",
            Self::RedirectUri => "redirect_uri",
            Self::ScopeAllowed => "scope_allowed",
            Self::PkceChallenge => "pkce_challenge",
        }
    }

    fn applicable_grant_types(&self) -> &'static [GrantType] {
        AUTHORIZATION_CODE
    }

    fn verify(&self, ctx: &AuthorizationRequestContext) -> AuthResult<()> {
        match self {
            Self::ResponseType => {
                if ctx.request.response_type == "code" {
                    Ok(())
                } else {
                    Err(AuthError::unsupported_response_type(
                        ctx.request.response_type.clone(),
                    ))
                }
            }
            Self::ClientRegistered => {
                let client = registered_client(ctx)?;
                if client.is_grant_type_allowed(GrantType::AuthorizationCode) {
                    Ok(())
                } else {
                    Err(AuthError::unauthorized_client(
                        "Client is not allowed to use the authorization code grant",
                    ))
                }
            }
            Self::RedirectUri => {
                let client = registered_client(ctx)?;
                let uri = ctx
                    .effective_redirect_uri()
                    .ok_or_else(|| AuthError::invalid_request("redirect_uri is required"))?;
                if client.is_redirect_uri_allowed(uri) {
                    Ok(())
                } else {
                    Err(AuthError::invalid_request(
                        "redirect_uri is not registered for this client",
                    ))
                }
            }
            Self::ScopeAllowed => {
                let client = registered_client(ctx)?;
                if client.allows_scopes(&ctx.scope) {
                    Ok(())
                } else {
                    let denied: Vec<_> = ctx.scope.difference(&client.scopes).collect();
                    Err(AuthError::invalid_scope(format!(
                        "Scope not allowed for client: {}",
                        denied.join(" ")
                    )))
                }
            }
            Self::PkceChallenge => verify_pkce_challenge(ctx),
        }
    }
}

fn registered_client(ctx: &AuthorizationRequestContext) -> AuthResult<&Client> {
    match ctx.client() {
        Some(client) if client.active => Ok(client),
        Some(_) => Err(AuthError::invalid_client("Client is inactive")),
        None => Err(AuthError::invalid_client("Unknown client")),
    }
}

fn verify_pkce_challenge(ctx: &AuthorizationRequestContext) -> AuthResult<()> {
    let request = &ctx.request;
    match (&request.code_challenge, &request.code_challenge_method) {
        (Some(challenge), method) => {
            // RFC 7636 defaults a missing method to "plain", which is refused.
            PkceChallengeMethod::parse(method.as_deref().unwrap_or("plain"))?;
            PkceChallenge::new(challenge.as_str())?;
            Ok(())
        }
        (None, Some(_)) => Err(AuthError::invalid_request(
            "code_challenge_method given without code_challenge",
        )),
        (None, None) => {
            if registered_client(ctx)?.requires_pkce() {
                Err(AuthError::invalid_request(
                    "code_challenge is required for public clients",
                ))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::authorize::AuthorizationRequest;
    use crate::oauth::pkce::PkceVerifier;
    use crate::types::ScopeSet;

    fn client(confidential: bool) -> Client {
        Client {
            client_id: "c1".to_string(),
            secret_hash: confidential.then(|| "hash".to_string()),
            name: "App".to_string(),
            grant_types: vec![GrantType::AuthorizationCode],
            redirect_uris: vec!["https://app/cb".to_string()],
            scopes: ScopeSet::parse("read write"),
            confidential,
            active: true,
            access_token_lifetime: None,
        }
    }

    fn context(request: AuthorizationRequest, client: Option<Client>) -> AuthorizationRequestContext {
        AuthorizationRequestContext::new(request, "alice").with_client(client)
    }

    fn request() -> AuthorizationRequest {
        AuthorizationRequest {
            response_type: "code".to_string(),
            client_id: "c1".to_string(),
            redirect_uri: Some("https://app/cb".to_string()),
            scope: Some("read".to_string()),
            state: Some("xyz".to_string()),
            code_challenge: None,
            code_challenge_method: None,
        }
    }

    fn check(ctx: &AuthorizationRequestContext) -> AuthResult<()> {
        crate::oauth::verifier::run_verifiers(&AuthorizationVerifier::STANDARD, ctx)
    }

    #[test]
    fn test_valid_confidential_request() {
        assert!(check(&context(request(), Some(client(true)))).is_ok());
    }

    #[test]
    fn test_response_type() {
        let mut req = request();
        req.response_type = "token".to_string();
        let err = check(&context(req, Some(client(true)))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_response_type");
    }

    #[test]
    fn test_unknown_and_inactive_client() {
        let err = check(&context(request(), None)).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");

        let mut inactive = client(true);
        inactive.active = false;
        let err = check(&context(request(), Some(inactive))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");
    }

    #[test]
    fn test_grant_not_allowed() {
        let mut c = client(true);
        c.grant_types = vec![GrantType::Password];
        let err = check(&context(request(), Some(c))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "unauthorized_client");
    }

    #[test]
    fn test_redirect_uri() {
        let mut req = request();
        req.redirect_uri = Some("https://evil/cb".to_string());
        let err = check(&context(req, Some(client(true)))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");

        // omitted: falls back to the single registered URI
        let mut req = request();
        req.redirect_uri = None;
        assert!(check(&context(req, Some(client(true)))).is_ok());
    }

    #[test]
    fn test_scope_not_allowed() {
        let mut req = request();
        req.scope = Some("read admin".to_string());
        let err = check(&context(req, Some(client(true)))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_scope");
        assert!(err.to_string().contains("admin"));
    }

    #[test]
    fn test_public_client_requires_pkce() {
        let err = check(&context(request(), Some(client(false)))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");

        let verifier = PkceVerifier::generate();
        let mut req = request();
        req.code_challenge = Some(PkceChallenge::from_verifier(&verifier).as_str().to_string());
        req.code_challenge_method = Some("S256".to_string());
        assert!(check(&context(req.clone(), Some(client(false)))).is_ok());

        req.code_challenge_method = None;
        assert!(check(&context(req.clone(), Some(client(false)))).is_err());

        req.code_challenge_method = Some("S256".to_string());
        req.code_challenge = Some("short".to_string());
        assert!(check(&context(req, Some(client(false)))).is_err());
    }

    #[test]
    fn test_verifier_metadata() {
        for verifier in AuthorizationVerifier::STANDARD {
            assert_eq!(
                verifier.applicable_grant_types(),
                &[GrantType::AuthorizationCode]
            );
            assert!(!verifier.name().is_empty());
        }
    }
}
