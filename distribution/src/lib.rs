//! Distribution adapter that pushes media tracks to a third-party video
//! platform, plus the job shim a host framework drives it through.

pub mod config;
pub mod error;
pub mod job;
pub mod mediapackage;
pub mod service;
#[cfg(test)]
mod test;

pub use config::{read_config, DistributionConfig};
pub use error::DistributionError;
pub use job::{
    DistributionJob, DistributionJobParams, DistributionJobResult, JobHandle, Operation,
    UnknownOperation,
};
pub use mediapackage::{Element, ElementType, MediaPackage};
pub use service::{DistributionService, RetractOutcome};
