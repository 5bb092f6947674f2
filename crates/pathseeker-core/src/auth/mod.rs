//! Authentication module for managing the user's session and tokens.
//!
//! This module provides:
//! - `SessionManager`: login/logout, credential attachment, refresh-once recovery
//! - `IdentityClient`: non-intercepted token issuance and renewal
//! - `TokenStore` implementations: JSON file, OS keychain, in-memory
//!
//! Tokens are persisted as two named entries, `access` and `refresh`.

pub mod credentials;
pub mod identity;
pub mod session;
pub mod store;
pub mod tokens;

pub use credentials::KeyringTokenStore;
pub use identity::IdentityClient;
pub use session::{Redirect, SessionManager, LOGIN_PATH};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use tokens::{CredentialPair, TokenKey};
