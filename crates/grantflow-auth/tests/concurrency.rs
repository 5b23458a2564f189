//! Single-use guarantees under concurrent redemption.

mod common;

use common::*;
use grantflow_auth::prelude::*;

const CONTENDERS: usize = 16;

/// Counts successes and asserts every failure is `invalid_grant`.
async fn race(server: &Server, ctx: TokenRequestContext) -> Vec<TokenClaims> {
    let mut handles = Vec::with_capacity(CONTENDERS);
    for _ in 0..CONTENDERS {
        let dispatcher = server.dispatcher.clone();
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            dispatcher.process_token_request(&ctx).await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(claims) => winners.push(claims),
            Err(err) => assert_eq!(err.oauth_error_code(), "invalid_grant"),
        }
    }
    winners
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_code_exchange_single_winner() {
    let server = server();
    let verifier = PkceVerifier::generate();
    let challenge = PkceChallenge::from_verifier(&verifier);

    // Public client: no secret hashing on the hot path.
    let auth = AuthorizationRequestContext::new(
        AuthorizationRequest {
            code_challenge: Some(challenge.as_str().to_string()),
            code_challenge_method: Some("S256".to_string()),
            ..authorize_request("spa", SPA_REDIRECT, "read")
        },
        "alice",
    );
    let code = server
        .dispatcher
        .process_authorization_request(&auth)
        .await
        .unwrap()
        .code;

    let ctx = TokenRequestContext::new(TokenRequest {
        code_verifier: Some(verifier.as_str().to_string()),
        ..code_exchange(&code, "spa", None, SPA_REDIRECT)
    });
    let winners = race(&server, ctx).await;

    assert_eq!(winners.len(), 1);
    assert_eq!(server.tokens.len(), 1);
    assert!(server.authorizations.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_single_winner() {
    let server = server();
    let verifier = PkceVerifier::generate();
    let challenge = PkceChallenge::from_verifier(&verifier);

    let auth = AuthorizationRequestContext::new(
        AuthorizationRequest {
            code_challenge: Some(challenge.as_str().to_string()),
            code_challenge_method: Some("S256".to_string()),
            ..authorize_request("spa", SPA_REDIRECT, "read")
        },
        "alice",
    );
    let code = server
        .dispatcher
        .process_authorization_request(&auth)
        .await
        .unwrap()
        .code;
    let exchange = TokenRequestContext::new(TokenRequest {
        code_verifier: Some(verifier.as_str().to_string()),
        ..code_exchange(&code, "spa", None, SPA_REDIRECT)
    });
    let original = server.dispatcher.process_token_request(&exchange).await.unwrap();
    let refresh = server
        .services
        .signer
        .issue_refresh_token(&original)
        .unwrap()
        .unwrap();

    let ctx = TokenRequestContext::new(TokenRequest {
        refresh_token: Some(refresh),
        ..TokenRequest::new("refresh_token").with_client("spa", None)
    });
    let winners = race(&server, ctx).await;

    assert_eq!(winners.len(), 1);
    let active = TokenLifecycle::new(server.tokens.clone())
        .list_active()
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].jti, winners[0].jti);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_revocation_visible_across_tasks() {
    let server = server();
    let ctx = TokenRequestContext::new(
        TokenRequest::new("client_credentials").with_client("c1", Some(SECRET)),
    );
    let claims = server.dispatcher.process_token_request(&ctx).await.unwrap();

    let lifecycle = std::sync::Arc::new(TokenLifecycle::new(server.tokens.clone()));
    let revoker = {
        let lifecycle = lifecycle.clone();
        let jti = claims.jti.clone();
        tokio::spawn(async move { lifecycle.revoke(&jti).await.unwrap() })
    };
    assert!(revoker.await.unwrap());

    let observer = {
        let lifecycle = lifecycle.clone();
        let jti = claims.jti.clone();
        tokio::spawn(async move { lifecycle.introspect(&jti).await.unwrap() })
    };
    assert!(!observer.await.unwrap().active);
}
