//! REST client for a digital-repository system: object and datastream CRUD,
//! relationship management and content-model lookup through the repository's
//! triple-store query endpoint.

pub mod client;
pub mod config;
pub mod error;
pub mod object;
pub mod profile;
#[cfg(test)]
mod test;

pub use client::{format_repository_date, parse_repository_date, RepositoryClient};
pub use config::{read_config, RepositoryConfig};
pub use error::RepositoryError;
pub use object::{CacheSlot, ControlGroup, ObjectHandle};
pub use profile::{DatastreamField, DatastreamProfile, ObjectProfile};
