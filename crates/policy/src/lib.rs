//! Client-side access evaluation for the bucketgate console.
//!
//! Core principle: **nothing is allowed unless a statement explicitly
//! grants it, and any matching deny wins.**
//!
//! # Overview
//!
//! - [`PolicyStatement`]: effect, action patterns and resource patterns,
//!   validated once at the boundary ([`SessionPayload`]).
//! - [`PolicyCache`]: holds the current [`Session`]; replaced on login,
//!   cleared on logout or session expiry.
//! - [`PolicySnapshot`]: immutable view handed to evaluators.
//! - [`evaluate`] / [`AccessQuery`]: the scope matcher.
//! - [`SecureGate`]: turns a decision into a [`Verdict`] for the UI.
//!
//! These answers only shape what the console offers. The server enforces.
//!
//! # Example
//!
//! ```
//! use policy::{scopes, PolicyCache, PolicyStatement, Session, SecureGate, ErrorProps, Verdict};
//!
//! let cache = PolicyCache::new();
//! cache.load(Session::new("alice").with_statement(
//!     "stmt1",
//!     PolicyStatement::allow([scopes::S3_GET_OBJECT], ["bucket1/*"])?,
//! ));
//!
//! let snapshot = cache.get();
//! assert!(snapshot.has_permission("bucket1/a.txt", &[scopes::S3_GET_OBJECT], false, false));
//! assert!(!snapshot.has_permission("bucket2/a.txt", &[scopes::S3_GET_OBJECT], false, false));
//!
//! let upload = SecureGate::new("bucket1/", scopes::UPLOAD_SCOPES)
//!     .error_props(ErrorProps::disabled());
//! assert_eq!(upload.decide(&snapshot), Verdict::Disable(ErrorProps::disabled()));
//! # Ok::<(), policy::Error>(())
//! ```

mod cache;
mod error;
mod gate;
mod matcher;
pub mod scopes;
mod snapshot;
mod statement;
mod wire;

pub use cache::PolicyCache;
pub use error::{Error, Result};
pub use gate::{ErrorProps, Fragment, SecureGate, Verdict};
pub use matcher::{AccessQuery, Resources, evaluate, wildcard_grants};
pub use snapshot::{PolicySnapshot, Session};
pub use statement::{ActionPattern, Effect, PolicyStatement, ResourcePattern, ResourceSet};
pub use wire::SessionPayload;
