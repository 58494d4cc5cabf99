//! Identity resolution and access control.
//!
//! The pipeline runs strictly in order per request: tenant resolution
//! ([`tenant`]), credential verification ([`claims`] / [`token`]), identity
//! loading and the access gate ([`gate`]). Nothing here is cached across
//! requests, so disabling a tenant, user, or membership takes effect on the
//! very next request.

pub mod claims;
pub mod gate;
pub mod models;
pub mod password;
pub mod tenant;
pub mod token;
