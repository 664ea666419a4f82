//! Order lifecycle engine for a dream interpretation marketplace
//!
//! The web layer stays outside this crate; it drives [`service::OrderService`]
//! through its typed API and implements the [`identity::IdentityResolver`]
//! and [`notify::Notifier`] seams.

pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod identity;
pub mod notify;
pub mod order;
pub mod pricing;
pub mod service;
pub mod user;
pub mod utils;
