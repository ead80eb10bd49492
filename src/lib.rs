//! Lifecycle engine for CDT deposit requests.
//!
//! Customers draft, edit, submit, and cancel requests; agents approve or
//! reject them. [`engine::LifecycleEngine`] owns every transition and its
//! guards, [`request::History`] keeps the append-only audit trail,
//! [`projection`] derives list-screen views, and [`service::RequestService`]
//! persists requests in sled with compare-and-set update semantics.

pub mod engine;
pub mod error;
pub mod projection;
pub mod request;
pub mod service;
pub mod utils;
pub mod validation;
