//! PDF Annotator Scheduler Library
//!
//! Cooperative cancellation primitives for asynchronous editor work.
//!
//! This crate provides the two token types the editor uses to keep
//! asynchronous results consistent with the UI state:
//!
//! - [`CancellationToken`] for cooperative cancellation of background work
//!   (thumbnail generation checks it between pages).
//! - [`RequestTokens`] for cancel-superseded render requests: every render
//!   request is stamped with a monotonically increasing token, and a
//!   completion is applied only if its token is still the latest one
//!   issued. A newer request invalidates an older pending one rather than
//!   queuing behind it.
//!
//! # Example
//!
//! ```
//! use pdf_annotator_scheduler::RequestTokens;
//!
//! let tokens = RequestTokens::new();
//!
//! let first = tokens.issue();
//! let second = tokens.issue();
//!
//! // The first request was superseded before it completed; its result
//! // must be discarded on arrival.
//! assert!(!tokens.is_current(first));
//! assert!(tokens.is_current(second));
//! ```

mod cancel;
mod request;

// Re-export public API
pub use cancel::CancellationToken;
pub use request::{RequestToken, RequestTokens};
