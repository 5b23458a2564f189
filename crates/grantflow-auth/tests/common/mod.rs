//! Shared setup for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grantflow_auth::notify::NotificationError;
use grantflow_auth::prelude::*;
use grantflow_auth::secret;
use grantflow_auth::token::{SigningAlgorithm, SigningKeyPair};
use tracing_subscriber::EnvFilter;

pub const ISSUER: &str = "https://auth.example.com";
pub const SECRET: &str = "s3cret";
pub const REDIRECT: &str = "https://app/cb";
pub const SPA_REDIRECT: &str = "https://spa.example.com/cb";

/// Collects every delivered event.
#[derive(Default)]
pub struct RecordingSender {
    pub events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSender {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.kind()).collect()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub struct Server {
    pub config: Arc<AuthConfig>,
    pub keys: Arc<KeyRegistry>,
    pub services: Arc<FlowServices>,
    pub dispatcher: Arc<FlowDispatcher>,
    pub authorizations: Arc<InMemoryAuthorizationStorage>,
    pub tokens: Arc<InMemoryAccessTokenStorage>,
    pub events: Option<Arc<RecordingSender>>,
}

/// `c1` is confidential with every grant, `spa` is a public PKCE client.
pub fn register_clients(clients: &InMemoryClientRegistry) {
    clients
        .register(Client {
            client_id: "c1".to_string(),
            secret_hash: Some(secret::hash_secret(SECRET).unwrap()),
            name: "Backend".to_string(),
            grant_types: GrantType::ALL.to_vec(),
            redirect_uris: vec![REDIRECT.to_string()],
            scopes: ScopeSet::parse("read write"),
            confidential: true,
            active: true,
            access_token_lifetime: None,
        })
        .unwrap();
    clients
        .register(Client {
            client_id: "spa".to_string(),
            secret_hash: None,
            name: "Single page app".to_string(),
            grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
            redirect_uris: vec![SPA_REDIRECT.to_string()],
            scopes: ScopeSet::parse("read"),
            confidential: false,
            active: true,
            access_token_lifetime: None,
        })
        .unwrap();
}

/// Routes engine logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn server() -> Server {
    build(None)
}

/// Like [`server`], with notifications going to a [`RecordingSender`].
/// Needs a runtime.
pub fn server_with_events() -> Server {
    build(Some(Arc::new(RecordingSender::default())))
}

fn build(events: Option<Arc<RecordingSender>>) -> Server {
    init_tracing();

    let config = AuthConfig {
        issuer: ISSUER.to_string(),
        ..AuthConfig::default()
    };
    config.validate().unwrap();
    let config = Arc::new(config);

    let keys = Arc::new(KeyRegistry::new(
        SigningKeyPair::generate(SigningAlgorithm::ES384).unwrap(),
    ));

    let clients = Arc::new(InMemoryClientRegistry::new());
    register_clients(&clients);

    let owners = Arc::new(InMemoryResourceOwnerStore::new());
    owners
        .add_user("alice", "wonderland", "user-alice", vec!["admin".to_string()])
        .unwrap();

    let authorizations = Arc::new(InMemoryAuthorizationStorage::new());
    let tokens = Arc::new(InMemoryAccessTokenStorage::new());

    let mut services = FlowServices::new(
        config.clone(),
        keys.clone(),
        clients,
        owners,
        authorizations.clone(),
        tokens.clone(),
    );
    if let Some(sender) = &events {
        let (notifier, _worker) = NotificationDispatcher::spawn(sender.clone(), 64);
        services = services.with_notifier(notifier);
    }
    let services = Arc::new(services);
    let dispatcher = Arc::new(FlowDispatcher::from_config(services.clone()));

    Server {
        config,
        keys,
        services,
        dispatcher,
        authorizations,
        tokens,
        events,
    }
}

pub fn authorize_request(client_id: &str, redirect_uri: &str, scope: &str) -> AuthorizationRequest {
    AuthorizationRequest {
        response_type: "code".to_string(),
        client_id: client_id.to_string(),
        redirect_uri: Some(redirect_uri.to_string()),
        scope: Some(scope.to_string()),
        state: Some("xyz".to_string()),
        ..AuthorizationRequest::default()
    }
}

pub fn code_exchange(code: &str, client_id: &str, secret: Option<&str>, redirect_uri: &str) -> TokenRequest {
    TokenRequest {
        code: Some(code.to_string()),
        redirect_uri: Some(redirect_uri.to_string()),
        ..TokenRequest::new("authorization_code").with_client(client_id, secret)
    }
}

/// Runs the front channel for `c1` and returns the issued code.
pub async fn authorize_c1(server: &Server, scope: &str) -> String {
    let ctx = AuthorizationRequestContext::new(authorize_request("c1", REDIRECT, scope), "alice");
    server
        .dispatcher
        .process_authorization_request(&ctx)
        .await
        .unwrap()
        .code
}
