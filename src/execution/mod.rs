//! Report run execution

pub mod dispatcher;
pub mod errors;
pub mod escalator;
pub mod orchestrator;
pub mod reporter;
pub mod runner;
pub mod waiter;

pub use dispatcher::{import_request, ImporterDispatcher};
pub use errors::{DataTimeoutError, JobFailure};
pub use escalator::{report_subject, FailureEscalator};
pub use orchestrator::JobOrchestrator;
pub use reporter::{EventHandler, Reporter, RunEvent};
pub use runner::{Collaborators, PipelineRunner};
pub use waiter::{partition_available, DataAvailabilityWaiter, WaitOptions};
