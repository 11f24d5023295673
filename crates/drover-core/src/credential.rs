//! Credential delegation collaborator.
//!
//! Delegation itself (myproxy logon, renewal) is another subsystem; a
//! backend only asks for a valid short-lived credential for a principal and
//! receives the path of the materialized token.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("credential delegation failed for {principal}: {reason}")]
    Delegation { principal: String, reason: String },
}

pub trait CredentialProvider: Send + Sync {
    /// Fetch a valid delegated credential for the given principal and
    /// return the path of the token on local disk.
    fn fetch(&self, principal: &str) -> Result<Utf8PathBuf, CredentialError>;
}
