//! Credential storage, session tokens, and request authentication.

pub mod credentials;
pub mod extractor;
pub mod password;
pub mod token;

pub use extractor::{AuthenticatedUser, TOKEN_COOKIE};
pub use token::{SessionError, SessionIssuer};
