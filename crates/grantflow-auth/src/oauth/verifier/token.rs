//! Verifiers for token requests.
//!
//! Order matters only for cost: lookups and presence checks run before the
//! Argon2 secret comparison.

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::context::TokenRequestContext;
use crate::oauth::pkce::PkceVerifier;
use crate::oauth::verifier::RequestVerifier;
use crate::secret;
use crate::types::{Client, GrantType};

const ALL_GRANTS: &[GrantType] = &GrantType::ALL;
const SCOPED_GRANTS: &[GrantType] = &[GrantType::ClientCredentials, GrantType::Password];
const CODE_GRANT: &[GrantType] = &[GrantType::AuthorizationCode];

/// Checks run on token requests, filtered by grant type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerifier {
    /// `client_id` names an active registered client.
    ClientRegistered,
    /// The client may use the requested grant type.
    GrantAllowed,
    /// Grant-specific parameters are present.
    RequiredParameters,
    /// Requested scopes are within the client's allowance.
    ScopeAllowed,
    /// `code_verifier`, when present, is syntactically valid.
    CodeVerifierFormat,
    /// Confidential clients presented the right secret.
    ClientSecret,
}

impl TokenVerifier {
    /// Standard order, cheapest first.
    pub const STANDARD: [TokenVerifier; 6] = [
        Self::ClientRegistered,
        Self::GrantAllowed,
        Self::RequiredParameters,
        Self::ScopeAllowed,
        Self::CodeVerifierFormat,
        Self::ClientSecret,
    ];

    #[must_use]
    pub fn applies_to(&self, grant_type: GrantType) -> bool {
        RequestVerifier::<TokenRequestContext>::applicable_grant_types(self).contains(&grant_type)
    }
}

impl RequestVerifier<TokenRequestContext> for TokenVerifier {
    fn name(&self) -> &'static str {
        match self {
            Self::ClientRegistered => "client_registered",
            Self::GrantAllowed => "grant_allowed",
            Self::RequiredParameters => "required_parameters",
            Self::ScopeAllowed => "scope_allowed",
            Self::CodeVerifierFormat => "code_verifier_format",
            Self::ClientSecret => "client_secret",
        }
    }

    fn applicable_grant_types(&self) -> &'static [GrantType] {
        match self {
            Self::ScopeAllowed => SCOPED_GRANTS,
            Self::CodeVerifierFormat => CODE_GRANT,
            _ => ALL_GRANTS,
        }
    }

    fn verify(&self, ctx: &TokenRequestContext) -> AuthResult<()> {
        match self {
            Self::ClientRegistered => registered_client(ctx).map(|_| ()),
            Self::GrantAllowed => {
                let grant_type = ctx.grant_type()?;
                if registered_client(ctx)?.is_grant_type_allowed(grant_type) {
                    Ok(())
                } else {
                    Err(AuthError::unauthorized_client(format!(
                        "Client is not allowed to use the {grant_type} grant"
                    )))
                }
            }
            Self::RequiredParameters => verify_required_parameters(ctx),
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
            Self::CodeVerifierFormat => match &ctx.request.code_verifier {
                Some(verifier) => PkceVerifier::new(verifier.as_str())
                    .map(|_| ())
                    .map_err(AuthError::from),
                None => Ok(()),
            },
            Self::ClientSecret => verify_client_secret(ctx),
        }
    }
}

fn registered_client(ctx: &TokenRequestContext) -> AuthResult<&Client> {
    let client_id = ctx
        .client_id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AuthError::invalid_client("client_id is required"))?;
    match ctx.client() {
        Some(client) if client.client_id != client_id => {
            Err(AuthError::invalid_client("Unknown client"))
        }
        Some(client) if client.active => Ok(client),
        Some(_) => Err(AuthError::invalid_client("Client is inactive")),
        None => Err(AuthError::invalid_client("Unknown client")),
    }
}

fn require(value: Option<&String>, name: &str) -> AuthResult<()> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(AuthError::invalid_request(format!("{name} is required"))),
    }
}

fn verify_required_parameters(ctx: &TokenRequestContext) -> AuthResult<()> {
    let request = &ctx.request;
    match ctx.grant_type()? {
        GrantType::AuthorizationCode => require(request.code.as_ref(), "code"),
        GrantType::Password => {
            require(request.username.as_ref(), "username")?;
            require(request.password.as_ref(), "password")
        }
        GrantType::RefreshToken => require(request.refresh_token.as_ref(), "refresh_token"),
        GrantType::ClientCredentials => Ok(()),
    }
}

fn verify_client_secret(ctx: &TokenRequestContext) -> AuthResult<()> {
    let client = registered_client(ctx)?;
    if !client.confidential {
        return Ok(());
    }
    let presented = ctx
        .request
        .client_secret
        .as_deref()
        .ok_or_else(|| AuthError::invalid_client("Client authentication required"))?;
    let hash = client
        .secret_hash
        .as_deref()
        .ok_or_else(|| AuthError::invalid_client("Client has no secret configured"))?;
    match secret::verify_secret(presented, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::invalid_client("Invalid client secret")),
        Err(e) => Err(AuthError::internal(format!("Stored client secret hash is invalid: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::token::TokenRequest;
    use crate::oauth::verifier::run_verifiers;
    use crate::types::ScopeSet;

    fn service_client(secret: &str) -> Client {
        Client {
            client_id: "svc".to_string(),
            secret_hash: Some(secret::hash_secret(secret).unwrap()),
            name: "Service".to_string(),
            grant_types: vec![GrantType::ClientCredentials, GrantType::Password],
            redirect_uris: vec![],
            scopes: ScopeSet::parse("read write"),
            confidential: true,
            active: true,
            access_token_lifetime: None,
        }
    }

    fn check(request: TokenRequest, client: Option<Client>) -> AuthResult<()> {
        let ctx = TokenRequestContext::new(request).with_client(client);
        let grant = ctx.grant_type()?;
        let verifiers: Vec<_> = TokenVerifier::STANDARD
            .into_iter()
            .filter(|v| v.applies_to(grant))
            .collect();
        run_verifiers(&verifiers, &ctx)
    }

    #[test]
    fn test_client_credentials_ok() {
        let request = TokenRequest::new("client_credentials")
            .with_client("svc", Some("s3cret"))
            .with_scope("read");
        assert!(check(request, Some(service_client("s3cret"))).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let request = TokenRequest::new("client_credentials").with_client("svc", Some("nope"));
        let err = check(request, Some(service_client("s3cret"))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");

        let request = TokenRequest::new("client_credentials").with_client("svc", None);
        let err = check(request, Some(service_client("s3cret"))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");
    }

    #[test]
    fn test_missing_client_id() {
        let err = check(TokenRequest::new("client_credentials"), None).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");
    }

    #[test]
    fn test_grant_not_allowed() {
        let request = TokenRequest::new("authorization_code").with_client("svc", Some("s3cret"));
        let err = check(request, Some(service_client("s3cret"))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "unauthorized_client");
    }

    #[test]
    fn test_required_parameters() {
        let request = TokenRequest {
            username: Some("alice".to_string()),
            ..TokenRequest::new("password").with_client("svc", Some("s3cret"))
        };
        let err = check(request, Some(service_client("s3cret"))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_scope_not_allowed() {
        let request = TokenRequest::new("client_credentials")
            .with_client("svc", Some("s3cret"))
            .with_scope("admin");
        let err = check(request, Some(service_client("s3cret"))).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_scope");
    }

    #[test]
    fn test_code_verifier_format() {
        let ctx = TokenRequestContext::new(TokenRequest {
            code_verifier: Some("too-short".to_string()),
            ..TokenRequest::new("authorization_code")
        });
        let err = TokenVerifier::CodeVerifierFormat.verify(&ctx).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");

        let ctx = TokenRequestContext::new(TokenRequest::new("authorization_code"));
        assert!(TokenVerifier::CodeVerifierFormat.verify(&ctx).is_ok());
    }

    #[test]
    fn test_applicability() {
        assert!(TokenVerifier::ScopeAllowed.applies_to(GrantType::Password));
        assert!(!TokenVerifier::ScopeAllowed.applies_to(GrantType::RefreshToken));
        assert!(TokenVerifier::CodeVerifierFormat.applies_to(GrantType::AuthorizationCode));
        assert!(!TokenVerifier::CodeVerifierFormat.applies_to(GrantType::Password));
        assert!(TokenVerifier::ClientSecret.applies_to(GrantType::RefreshToken));
    }
}
