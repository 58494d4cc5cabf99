//! Noteloft database layer
//!
//! Repositories over a shared `PgPool`. Each repository owns one entity's
//! queries; nothing here caches across requests, so disablement of a tenant,
//! user, or membership takes effect on the very next lookup.

pub mod db;

pub use db::content::resource::{NoteResourceRecord, ResourceRepository};
pub use db::control::membership::MembershipRepository;
pub use db::control::tenant::TenantRepository;
pub use db::control::token::TokenRepository;
pub use db::control::user::{UserFilter, UserListItem, UserRepository, UserUpdate};
