//! Domain entities and validation rules

pub mod errors;
pub mod mapping;

pub use errors::DomainError;
pub use mapping::SyncMapping;
