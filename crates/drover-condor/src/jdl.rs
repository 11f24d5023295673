//! Pure construction of the job-description document for one batch.
//!
//! One shared header, then one stanza per job ending in its `Queue 1`
//! directive. The builder touches no filesystem or scheduler state; the
//! caller decides where the document lands.

use camino::Utf8Path;
use drover_core::JobRecord;
use std::collections::HashMap;

/// Everything a batch needs beyond the job records themselves.
pub struct SubmitContext<'a> {
    pub agent: &'a str,
    pub requirements: &'a str,
    pub executable: &'a Utf8Path,
    pub package_dir: &'a Utf8Path,
    pub unpacker: &'a Utf8Path,
    /// Batch task type is in the configured multicore set.
    pub multicore: bool,
    /// Delegated credential to attach, when that mode is active.
    pub proxy_file: Option<&'a Utf8Path>,
    /// Stamp the resolved endpoint as a glide-in site attribute.
    pub use_glide_site: bool,
    /// Route against the whole candidate-site list instead of the bound site.
    pub bulk_site_mode: bool,
    /// Resolved site name to endpoint map for this batch.
    pub endpoints: &'a HashMap<String, String>,
}

/// Build the job-description lines for one batch.
///
/// Returns `None` for an empty batch, or when every job had to be skipped;
/// the caller must treat that as nothing to submit. A job missing its cache
/// directory or site binding is skipped with a logged defect, never fatal
/// to the batch.
pub fn build_jdl(jobs: &[&JobRecord], ctx: &SubmitContext) -> Option<Vec<String>> {
    if jobs.is_empty() {
        tracing::error!("no jobs passed to the JDL builder");
        return None;
    }

    let mut jdl = header(ctx);
    let mut queued = 0usize;

    for job in jobs {
        let Some(cache_dir) = job.cache_dir.as_deref() else {
            tracing::error!("job {} has no cache directory, skipping it", job.id);
            continue;
        };
        let Some(site) = job.location.as_deref() else {
            tracing::error!("job {} is bound to no site, skipping it", job.id);
            continue;
        };
        let endpoint = ctx
            .endpoints
            .get(site)
            .map(String::as_str)
            .unwrap_or(site);

        jdl.push(format!("initialdir = {}", cache_dir));
        jdl.push(format!(
            "transfer_input_files = {}, {}/JobPackage.pkl, {}",
            job.sandbox, ctx.package_dir, ctx.unpacker
        ));
        jdl.push(format!(
            "arguments = {} {}",
            job.sandbox.file_name().unwrap_or_else(|| job.sandbox.as_str()),
            job.id
        ));

        if ctx.use_glide_site {
            jdl.push(format!("+GLIDEIN_CMSSite = \"{}\"", endpoint));
        }
        if ctx.bulk_site_mode && !job.possible_sites.is_empty() {
            jdl.push(format!(
                "+DESIRED_Sites = \"{}\"",
                job.possible_sites.join(", ")
            ));
        } else {
            jdl.push(format!("+DESIRED_Sites = \"{}\"", endpoint));
        }

        jdl.push(format!(
            "transfer_output_files = Report.{}.pkl",
            job.retry_count.unwrap_or(0)
        ));

        if let Some(priority) = &job.priority {
            match priority.parse::<i64>() {
                Ok(value) => jdl.push(format!("priority = {}", value)),
                Err(_) => tracing::error!(
                    "priority {:?} for job {} is not castable to an int, not setting priority",
                    priority,
                    job.id
                ),
            }
        }

        jdl.push(format!("+WMAgent_JobID = {}", job.jobid));
        jdl.push("Queue 1".to_string());
        queued += 1;
    }

    if queued == 0 {
        tracing::error!("every job in the batch was skipped, no JDL produced");
        return None;
    }
    Some(jdl)
}

fn header(ctx: &SubmitContext) -> Vec<String> {
    let mut jdl = vec![
        "universe = vanilla".to_string(),
        format!("requirements = {}", ctx.requirements),
        "should_transfer_files = YES".to_string(),
        "when_to_transfer_output = ON_EXIT".to_string(),
        "log_xml = True".to_string(),
        "notification = NEVER".to_string(),
        format!("Executable = {}", ctx.executable),
        "Output = condor.$(Cluster).$(Process).out".to_string(),
        "Error = condor.$(Cluster).$(Process).err".to_string(),
        "Log = condor.$(Cluster).$(Process).log".to_string(),
        "+DESIRED_Archs = \"INTEL,X86_64\"".to_string(),
        format!("+WMAgent_AgentName = \"{}\"", ctx.agent),
    ];
    if ctx.multicore {
        jdl.push("+DESIRES_HTPC = True".to_string());
    } else {
        jdl.push("+DESIRES_HTPC = False".to_string());
    }
    if let Some(proxy) = ctx.proxy_file {
        jdl.push(format!("x509userproxy = {}", proxy));
    }
    jdl
}
