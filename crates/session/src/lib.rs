//! Session plumbing around the policy cache.
//!
//! # Overview
//!
//! - **AuthFlow**: the single writer of the [`policy::PolicyCache`]. Loads
//!   the session after login, clears it on logout, and clears it when any
//!   API response says the session is no longer valid.
//! - **ConsoleClient**: `reqwest` client for the console server's
//!   `/api/v1` session endpoints.
//! - **TransferRegistry**: in-flight uploads and downloads, keyed by a short
//!   random id, cancellable through their tokio task handles.
//!
//! # Example
//!
//! ```ignore
//! use policy::PolicyCache;
//! use session::{AuthFlow, ConsoleClient, Credentials};
//! use std::sync::Arc;
//!
//! # async fn example() -> session::Result<()> {
//! let flow = AuthFlow::new(Arc::new(PolicyCache::new()));
//! let client = ConsoleClient::builder("http://localhost:9090", flow).build()?;
//! let snapshot = client.sign_in(&Credentials::new("alice", "secret")).await?;
//! println!("{} statements", snapshot.statements().count());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod flow;
mod transfer;

pub use client::{ConsoleClient, ConsoleClientBuilder, Credentials};
pub use error::{Error, Result};
pub use flow::{AuthFlow, INVALID_SESSION_MESSAGE, Signal, is_invalid_session};
pub use transfer::{TransferId, TransferInfo, TransferKind, TransferRegistry};
