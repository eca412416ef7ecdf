//! Generic JSON object store: CRUD, ACL enforcement, property/delta mutation
//! and a filter/sort/page query engine over client-defined bodies.

pub mod acl;
pub mod domain;
pub mod filter;
pub mod query;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::StorageObjectService;
