//! Admin authentication: credential check and HS256 session tokens.

pub mod errors;
pub mod session;

pub use errors::AuthError;
pub use session::{AdminAuthenticator, AdminSubject, IssuedToken, SessionClaims};
