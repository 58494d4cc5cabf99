//! Database repositories for the data access layer
//!
//! Repositories are organized into control/ (tenants, users, memberships,
//! tokens) and content/ (resources and their typed payloads). Each repository
//! is responsible for a specific domain entity and provides CRUD operations
//! and specialized queries.
//
// Control repositories (identity and tenancy)
pub mod control;
//
// Content repositories (resources)
pub mod content;
