//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own tile ordering, dashboard selection, sharing,
//! clipboard formatting and the identity flows, so route handlers can stay
//! focused on protocol translation and auth plumbing. Every data access goes
//! through the `DataService` / `IdentityStore` traits.

pub mod auth;
pub mod clipboard;
pub mod dashboard;
pub mod donation;
pub mod selection;
pub mod session;
pub mod share;
pub mod tile;
pub mod transfer;
