//! Storage contracts and the in-memory reference implementation.
//!
//! - [`AuthorizationStorage`] - pending authorization codes
//! - [`AccessTokenStorage`] - issued token records and revocation status
//! - [`ClientRegistry`] - registered clients (read only)
//! - [`ResourceOwnerStore`] - resource-owner credential checks
//!
//! Durable backends implement the same traits; the engine only ever holds
//! `Arc<dyn Trait>`.

pub mod access_token;
pub mod authorization;
pub mod client;
pub mod memory;
pub mod owner;
pub mod sweeper;

pub use access_token::AccessTokenStorage;
pub use authorization::AuthorizationStorage;
pub use client::ClientRegistry;
pub use memory::{
    InMemoryAccessTokenStorage, InMemoryAuthorizationStorage, InMemoryClientRegistry,
    InMemoryResourceOwnerStore,
};
pub use owner::{ResourceOwner, ResourceOwnerStore};
pub use sweeper::{ExpirySweeper, spawn_expiry_sweeper};
