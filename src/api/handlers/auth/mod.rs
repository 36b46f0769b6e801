//! Cookie sessions: issuing, clearing and verifying the `token` JWT.

pub mod principal;
pub mod session;
pub mod state;
pub mod token;

pub use principal::Principal;
pub use state::{AuthConfig, AuthState};
pub use token::{Claims, TokenError};
