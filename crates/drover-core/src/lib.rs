//! Shared vocabulary for the drover batch-submission adapter.
//!
//! Job records, the canonical status table, the configuration surface, the
//! backend capability trait, the completion-report artifact, and the
//! interfaces of the collaborators (site directory, credential delegation)
//! that live outside this system.

pub mod config;
pub mod credential;
pub mod plugin;
pub mod report;
pub mod sites;
pub mod types;

pub use config::DroverConfig;
pub use credential::{CredentialError, CredentialProvider};
pub use plugin::{BatchPlugin, PluginError};
pub use report::{JobReport, ReportEntry, ReportError};
pub use sites::{SiteDirectory, StaticSiteDirectory};
pub use types::{GlobalState, JobRecord, Status, SubmitOutcome, TrackOutcome};
