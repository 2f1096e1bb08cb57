//! `AgentGate` core — claims identities, token validation, and request adaptation.
//!
//! Transport-independent building blocks for the `AgentGate` server: the
//! validated [`ClaimsIdentity`] attached to each inbound request, the
//! [`TokenValidator`] seam to the external identity provider, the
//! [`RequestLike`] adaptation layer that reshapes a native HTTP request for
//! the activity pipeline, and the [`ActivityProcessor`] seam to the external
//! agent runtime.

pub mod auth;
pub mod claims;
pub mod processor;
pub mod request;
pub mod validator;

pub use auth::AuthConfig;
pub use claims::ClaimsIdentity;
pub use processor::{ActivityProcessor, ConnectionSettings, NullProcessor, ProcessedActivity};
pub use request::{AdaptedRequest, BodyError, RequestLike};
pub use validator::{JwtTokenValidator, TokenValidator, ValidationError};
