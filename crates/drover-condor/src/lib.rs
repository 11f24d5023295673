//! HTCondor backend for drover.
//!
//! Drives job submission through generated JDL files, reconciles live state
//! from `condor_q` classads, and handles completion bookkeeping and forced
//! removal.

pub mod classads;
pub mod failure;
pub mod jdl;
pub mod plugin;

pub use classads::{parse_class_ads, query_class_ads, status_from_code, ClassAd};
pub use failure::parse_submit_error;
pub use jdl::{build_jdl, SubmitContext};
pub use plugin::CondorPlugin;
