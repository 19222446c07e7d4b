//! Authentication and authorization for Shelf.
//!
//! Tokens are HS256 JWTs carrying the user's id, email and role. Passwords
//! are stored as bcrypt hashes. The two middleware functions in
//! [`middleware`] guard routes: [`middleware::require_auth`] verifies the
//! bearer token and [`middleware::require_roles`] checks the role allow-list.

pub mod claims;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod token;

pub use claims::Claims;
pub use middleware::{require_admin, require_auth, require_roles};
pub use password::{PasswordError, PasswordHasher};
pub use roles::Role;
pub use token::{JwtKeys, TokenError};
