//! Configuration surface for a scheduler backend.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default site-requirement expression attached to every submission.
pub const DEFAULT_REQUIREMENTS: &str = "(Memory >= 1 && OpSys == \"LINUX\" ) && (Arch == \"INTEL\" || Arch == \"X86_64\") && stringListMember(GLIDEIN_CMSSite, DESIRED_Sites)";

/// Backend configuration. Every field has a default so a partial document
/// deserializes cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroverConfig {
    /// Agent name stamped on every submission and used to constrain
    /// status queries.
    pub agent_name: String,

    /// Directory where job-description files are written.
    pub submit_dir: Utf8PathBuf,

    /// Executable transferred and run on the execution node.
    pub script_file: Utf8PathBuf,

    /// Directory holding the job package shipped with each job.
    pub package_dir: Utf8PathBuf,

    /// Sandbox unpacker shipped with each job.
    pub unpacker: Utf8PathBuf,

    /// Worker pool size.
    pub workers: usize,

    /// Timeout applied to every external command, in seconds. Also bounds
    /// how long a submit cycle waits for each worker result.
    pub command_timeout_secs: u64,

    /// Upper bound on jobs per submission batch.
    pub jobs_per_worker: usize,

    /// Remove job-description files once a submit cycle finishes.
    pub delete_jdl_files: bool,

    /// Grace window, in seconds, before a job missing from a failed status
    /// query is force-completed.
    pub remove_time_secs: u64,

    /// Task types routed to multicore slots.
    pub multicore_task_types: Vec<String>,

    /// Site-requirement expression override.
    pub requirements: String,

    /// Stamp the resolved site endpoint as a glide-in site attribute.
    pub use_glide_site: bool,

    /// Submit against the whole candidate-site list instead of the single
    /// bound site.
    pub bulk_site_mode: bool,

    /// Elevation helper re-owning delegated credentials before submission.
    pub glexec_path: Option<Utf8PathBuf>,

    /// Delegation parameters. Delegated-credential mode is active only when
    /// all three are set.
    pub server_cert: Option<Utf8PathBuf>,
    pub server_key: Option<Utf8PathBuf>,
    pub myproxy_server: Option<String>,

    /// Directory where delegated credentials are materialized.
    pub proxy_dir: Utf8PathBuf,

    /// Scheduler command names, overridable for testing.
    pub submit_command: String,
    pub query_command: String,
    pub remove_command: String,

    /// Static site to endpoint seed for the bundled site directory.
    pub sites: HashMap<String, String>,
}

impl Default for DroverConfig {
    fn default() -> Self {
        Self {
            agent_name: "drover".to_string(),
            submit_dir: Utf8PathBuf::from("submit"),
            script_file: Utf8PathBuf::from("submit.sh"),
            package_dir: Utf8PathBuf::from("."),
            unpacker: Utf8PathBuf::from("unpacker.py"),
            workers: 4,
            command_timeout_secs: 300,
            jobs_per_worker: 100,
            delete_jdl_files: true,
            remove_time_secs: 60,
            multicore_task_types: Vec::new(),
            requirements: DEFAULT_REQUIREMENTS.to_string(),
            use_glide_site: false,
            bulk_site_mode: false,
            glexec_path: None,
            server_cert: None,
            server_key: None,
            myproxy_server: None,
            proxy_dir: Utf8PathBuf::from("/tmp"),
            submit_command: "condor_submit".to_string(),
            query_command: "condor_q".to_string(),
            remove_command: "condor_rm".to_string(),
            sites: HashMap::new(),
        }
    }
}

impl DroverConfig {
    /// Delegated-credential mode is active only with a full parameter set.
    pub fn delegation_active(&self) -> bool {
        self.server_cert.is_some() && self.server_key.is_some() && self.myproxy_server.is_some()
    }
}
