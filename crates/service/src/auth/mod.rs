//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Accounts own storage objects through `AclParam`; removing an account
//! removes everything it owns.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;
pub mod token;

pub use service::AuthService;
