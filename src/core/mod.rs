//! Core engine: classification, verification, scheduling and result handling.

pub mod aggregator;
pub mod batch;
pub mod classifier;
pub mod export;
pub mod http;
pub mod logging;
pub mod model_catalog;
pub mod models;
pub mod patterns;
pub mod provider;
pub mod scheduler;
pub mod tidy;
pub mod verifier;

pub use aggregator::{BatchRunState, SharedRunState, SortColumn, SortDirection, SortState, Tally};
pub use batch::{BatchEvent, BatchOptions, BatchOutcome, BatchRunner};
pub use classifier::Classifier;
pub use export::ExportMode;
pub use models::{BalanceInfo, CredentialTask, TaskStatus, VerificationResult};
pub use provider::{Provider, ProviderFilter};
pub use scheduler::{QueuedTask, Scheduler, TaskSink};
pub use verifier::{ProviderRegistry, Verifier, VerifyContext};
