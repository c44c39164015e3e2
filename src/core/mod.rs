//! # Core Application Logic
//!
//! This module contains Headlines' business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Newsroom (state)     │
//!                    │  • Feed (pagination)    │
//!                    │  • Status (observed)    │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │ NewsSource │      │ Article    │      │Connectivity│
//!     │ (news::)   │      │ Store      │      │ Checker    │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `Newsroom` struct: both feeds and their statuses
//! - [`feed`]: Pure page accumulation for one feed
//! - [`status`]: `Status` and the `FetchError` taxonomy
//! - [`connectivity`]: The pre-flight network check
//! - [`bookmarks`]: Saved-article storage
//! - [`config`]: Layered settings

pub mod bookmarks;
pub mod config;
pub mod connectivity;
pub mod feed;
pub mod state;
pub mod status;

pub use state::{FeedStatus, Newsroom};
pub use status::{FetchError, Status};
