//! Request authentication.
//!
//! Only installed in dev mode. In production the options never apply
//! authentication, so the serving layer runs without this middleware.
//!
//! # Data Flow
//! ```text
//! --token-auth-file
//!     → token.rs (parse static tokens into a TokenAuthenticator)
//!     → ServerConfig.authentication
//!     → middleware.rs (Bearer token check per request)
//! ```

pub mod middleware;
pub mod token;

pub use middleware::authenticate;
pub use token::{TokenAuthenticator, UserInfo, LOOPBACK_USER};
