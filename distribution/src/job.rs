use std::str::FromStr;
use std::sync::Arc;

use eyre::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, Instrument};

use crate::mediapackage::MediaPackage;
use crate::service::{DistributionService, RetractOutcome};

/// Operations the job registry can ask this service to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Distribute,
    Retract,
}

#[derive(Debug, thiserror::Error)]
#[error("don't know how to handle operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Operation, UnknownOperation> {
        match s {
            "Distribute" => Ok(Operation::Distribute),
            "Retract" => Ok(Operation::Retract),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

/// A job as handed over by the registry: the operation plus its ordered
/// argument list, `[mediapackage XML, element id]`.
#[derive(Debug, Clone)]
pub struct DistributionJobParams {
    pub operation: Operation,
    pub arguments: Vec<String>,
}

#[derive(Debug)]
pub enum DistributionJobResult {
    /// XML of the distributed element, or None when the element was skipped.
    Distributed(Option<String>),
    /// XML of the element left in place; retraction is not supported remotely.
    Retracted(String),
}

pub struct JobHandle {
    pub join_handle: tokio::task::JoinHandle<Result<DistributionJobResult>>,
    pub cancel: CancellationToken,
}

pub struct DistributionJob {
    params: DistributionJobParams,
    service: Arc<DistributionService>,
}

impl DistributionJob {
    pub fn new(params: DistributionJobParams, service: Arc<DistributionService>) -> DistributionJob {
        DistributionJob { params, service }
    }

    pub fn start(self) -> JobHandle {
        let cancel = CancellationToken::new();
        let cancel_copy = cancel.clone();
        let join_handle = tokio::spawn(async move { self.run(cancel_copy).await });
        JobHandle {
            join_handle,
            cancel,
        }
    }

    #[instrument(name = "DistributionJob", skip(self, cancel))]
    async fn run(self, cancel: CancellationToken) -> Result<DistributionJobResult> {
        if cancel.is_cancelled() {
            bail!("job was cancelled before it started");
        }
        let [mediapackage_xml, element_id] = self.params.arguments.as_slice() else {
            bail!(
                "argument list for operation '{:?}' does not meet expectations",
                self.params.operation
            );
        };
        let mediapackage = MediaPackage::from_xml(mediapackage_xml)
            .wrap_err("error parsing mediapackage argument")?;
        match self.params.operation {
            Operation::Distribute => {
                let distributed = self
                    .service
                    .distribute(&mediapackage, element_id)
                    .in_current_span()
                    .await
                    .wrap_err("error distributing to the video platform")?;
                Ok(DistributionJobResult::Distributed(
                    distributed.map(|element| element.to_xml()),
                ))
            }
            Operation::Retract => {
                let RetractOutcome::NotSupported { element } = self
                    .service
                    .retract(&mediapackage, element_id)
                    .wrap_err("error retracting from the video platform")?;
                Ok(DistributionJobResult::Retracted(element.to_xml()))
            }
        }
    }
}
