//! Shelf application library
//!
//! Users, books and reviews modules plus the wiring that connects them to
//! storage. Shared by the server binary and `shelf-cli`.

pub mod bootstrap;
pub mod error;
pub mod modules;

#[cfg(test)]
mod test_support;

pub use bootstrap::{build_registry, migrate, Stores};
pub use error::{ServiceError, ServiceResult};
