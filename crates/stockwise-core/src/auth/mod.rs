//! Session handling: where the token lives and who the session belongs to.
//!
//! This module provides:
//! - `SessionStore`: injectable token storage (memory, file, OS keychain)
//! - `Navigator`: where the client hands off when a session ends
//! - `SessionCapability`: the role gate derived from `/auth/validate`
//!
//! Tokens carry no client-side expiry; a 401 from the backend is the only
//! signal that a session is gone.

pub mod capability;
pub mod credentials;
pub mod navigator;
pub mod session;

pub use capability::{Role, SessionCapability};
pub use credentials::KeyringSessionStore;
pub use navigator::{LogNavigator, Navigator};
pub use session::{FileSessionStore, MemorySessionStore, SessionData, SessionStore, Teardown};
