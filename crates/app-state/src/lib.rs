//! Application state for Social Confidence
//!
//! This crate holds the signed-in session and the cancellable request slot
//! that backs the advice screen.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod request;
pub mod session;

pub use request::{LatestRequest, RequestState};
pub use session::{
    FakeIdentityProvider, IdentityError, IdentityProvider, Plan, Result, SessionError,
    SessionStore, User, UserUpdate,
};
