//! Submission lifecycle orchestration for the HTCondor backend.
//!
//! Owns the lazily-spawned worker pool, a site-endpoint cache, and the
//! collaborator handles. All job-record mutation happens here, after worker
//! results are collected, never inside a worker.

use crate::classads::{query_class_ads, status_from_code};
use crate::failure::parse_submit_error;
use crate::jdl::{build_jdl, SubmitContext};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use drover_core::{
    BatchPlugin, CredentialProvider, DroverConfig, JobRecord, JobReport, PluginError,
    SiteDirectory, Status, SubmitOutcome, TrackOutcome,
};
use drover_parsers::{run_command, tail_lines};
use drover_pool::{PoolError, WorkItem, WorkerPool};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::process;
use std::time::Duration;

/// HTCondor scheduler backend.
pub struct CondorPlugin {
    config: DroverConfig,
    pool: WorkerPool,
    sites: Box<dyn SiteDirectory>,
    credentials: Option<Box<dyn CredentialProvider>>,
    /// Lazily populated, never invalidated; site topology changes are
    /// out-of-band and rare.
    site_cache: HashMap<String, Option<String>>,
    /// Source credential kept for wrapping submissions with the elevation
    /// helper.
    glexec_proxy: Option<Utf8PathBuf>,
}

impl CondorPlugin {
    pub fn new(
        config: DroverConfig,
        sites: Box<dyn SiteDirectory>,
        credentials: Option<Box<dyn CredentialProvider>>,
    ) -> Self {
        if config.delegation_active() && credentials.is_none() {
            tracing::warn!(
                "delegated-credential parameters are set but no credential provider was supplied"
            );
        }
        let timeout = Duration::from_secs(config.command_timeout_secs);
        Self {
            config,
            pool: WorkerPool::spawn(0, timeout),
            sites,
            credentials,
            site_cache: HashMap::new(),
            glexec_proxy: None,
        }
    }

    pub fn config(&self) -> &DroverConfig {
        &self.config
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.config.command_timeout_secs)
    }

    /// Resolve a site through the directory, caching hits and misses alike.
    fn endpoint_for(&mut self, site: &str) -> Option<String> {
        if let Some(cached) = self.site_cache.get(site) {
            return cached.clone();
        }
        let endpoint = self.sites.endpoint(site);
        self.site_cache.insert(site.to_string(), endpoint.clone());
        endpoint
    }

    fn resolve_endpoints(&mut self, jobs: &[&JobRecord]) -> HashMap<String, String> {
        let mut endpoints = HashMap::new();
        for job in jobs {
            let Some(site) = job.location.as_deref() else {
                continue;
            };
            if endpoints.contains_key(site) {
                continue;
            }
            if let Some(endpoint) = self.endpoint_for(site) {
                endpoints.insert(site.to_string(), endpoint);
            }
        }
        endpoints
    }

    /// Fetch and, with an elevation helper configured, re-own the delegated
    /// credential for this cycle. Failures log and fall back to submitting
    /// without a credential line.
    async fn prepare_proxy(&mut self, jobs: &[JobRecord]) -> Option<Utf8PathBuf> {
        if !self.config.delegation_active() {
            return None;
        }
        let provider = self.credentials.as_ref()?;
        let first = jobs.first()?;
        let Some(user_dn) = first.user_dn.as_deref() else {
            tracing::error!(
                "asked to delegate a credential but job {} carries no principal",
                first.id
            );
            return None;
        };
        tracing::info!("fetching delegated credential for {}", user_dn);
        let proxy_file = match provider.fetch(user_dn) {
            Ok(path) => path,
            Err(err) => {
                tracing::error!("{}", err);
                return None;
            }
        };
        tracing::info!("credential stored in {}", proxy_file);

        if let Some(glexec) = self.config.glexec_path.clone() {
            let target = Utf8PathBuf::from(format!("{}.user", proxy_file));
            let command = format!(
                "export GLEXEC_CLIENT_CERT={}; export GLEXEC_SOURCE_PROXY={}; \
                 export GLEXEC_TARGET_PROXY={}; {} /usr/bin/id",
                proxy_file, proxy_file, target, glexec
            );
            match run_command(&command, self.command_timeout()).await {
                Ok(result) if result.exit_code == 0 => {
                    tracing::info!("re-owned user credential at {}", target);
                }
                Ok(result) => tracing::error!(
                    "elevation helper exited {}: {}",
                    result.exit_code,
                    result.stderr
                ),
                Err(err) => tracing::error!("failed to run the elevation helper: {}", err),
            }
            self.glexec_proxy = Some(proxy_file);
            return Some(target);
        }
        Some(proxy_file)
    }

    /// Submission command for one JDL file, wrapped with the elevation
    /// helper when one is configured.
    fn submission_command(&self, jdl_file: &Utf8Path, proxy_file: Option<&Utf8Path>) -> String {
        if let (Some(glexec), Some(source), Some(target)) = (
            self.config.glexec_path.as_deref(),
            self.glexec_proxy.as_deref(),
            proxy_file,
        ) {
            format!(
                "CS=`which {}`; export GLEXEC_CLIENT_CERT={}; export GLEXEC_SOURCE_PROXY={}; \
                 export GLEXEC_TARGET_PROXY={}; {} $CS {}",
                self.config.submit_command, source, source, target, glexec, jdl_file
            )
        } else {
            format!("{} {}", self.config.submit_command, jdl_file)
        }
    }
}

impl BatchPlugin for CondorPlugin {
    async fn submit(&mut self, jobs: &mut [JobRecord]) -> Result<SubmitOutcome, PluginError> {
        let mut outcome = SubmitOutcome::default();
        if jobs.is_empty() {
            return Ok(outcome);
        }

        let timeout = self.command_timeout();
        if self.pool.is_empty() {
            tracing::info!("starting worker pool with {} workers", self.config.workers);
            self.pool = WorkerPool::spawn(self.config.workers, timeout);
        }
        fs::create_dir_all(&self.config.submit_dir)?;

        let proxy_file = self.prepare_proxy(jobs).await;

        // Group by sandbox, then page each group into worker-sized batches.
        let mut by_sandbox: BTreeMap<&Utf8Path, Vec<usize>> = BTreeMap::new();
        for (index, job) in jobs.iter().enumerate() {
            by_sandbox
                .entry(job.sandbox.as_path())
                .or_default()
                .push(index);
        }
        let page = self.config.jobs_per_worker.max(1);
        let batches: Vec<Vec<usize>> = by_sandbox
            .values()
            .flat_map(|group| group.chunks(page).map(<[usize]>::to_vec))
            .collect();

        let mut pending: HashMap<i64, usize> = HashMap::new();
        let mut jdl_files: Vec<Utf8PathBuf> = Vec::new();
        let mut n_submits = 0usize;
        let mut queue_error = false;
        let mut unbuildable = false;

        for batch in &batches {
            if queue_error {
                // A severed channel poisons the whole cycle; nothing more
                // is enqueued until the pool is rebuilt.
                break;
            }
            let members: Vec<&JobRecord> = batch.iter().map(|&i| &jobs[i]).collect();
            let endpoints = self.resolve_endpoints(&members);
            let multicore = members[0]
                .task_type
                .as_deref()
                .map(|t| self.config.multicore_task_types.iter().any(|m| m == t))
                .unwrap_or(false);
            let context = SubmitContext {
                agent: &self.config.agent_name,
                requirements: &self.config.requirements,
                executable: &self.config.script_file,
                package_dir: &self.config.package_dir,
                unpacker: &self.config.unpacker,
                multicore,
                proxy_file: proxy_file.as_deref(),
                use_glide_site: self.config.use_glide_site,
                bulk_site_mode: self.config.bulk_site_mode,
                endpoints: &endpoints,
            };
            let Some(lines) = build_jdl(&members, &context) else {
                tracing::error!("no JDL file made, aborting this submit cycle");
                unbuildable = true;
                break;
            };
            let jdl_file = self
                .config
                .submit_dir
                .join(format!("submit_{}_{}.jdl", process::id(), members[0].id));
            fs::write(&jdl_file, lines.join("\n") + "\n")?;
            jdl_files.push(jdl_file.clone());

            let command = self.submission_command(&jdl_file, proxy_file.as_deref());
            tracing::info!("about to submit {} jobs", batch.len());
            for &index in batch {
                pending.insert(jobs[index].id, index);
            }
            let id_list: Vec<i64> = batch.iter().map(|&i| jobs[i].id).collect();
            match self.pool.enqueue(WorkItem { command, id_list }) {
                Ok(()) => n_submits += 1,
                Err(err) => {
                    tracing::error!(
                        "could not hand work to the pool: {}; refreshing the pool at the end of this cycle",
                        err
                    );
                    queue_error = true;
                }
            }
        }

        // Drain exactly as many results as batches made it onto the channel.
        for _ in 0..n_submits {
            let result = match self.pool.collect().await {
                Ok(result) => result,
                Err(PoolError::ReceiveTimeout(t)) => {
                    tracing::error!(
                        "no worker result within {:?}; that batch's jobs stay unclassified this cycle",
                        t
                    );
                    queue_error = true;
                    continue;
                }
                Err(err) => {
                    tracing::error!(
                        "failed retrieving output from a worker: {}; refreshing the pool at the end of this cycle",
                        err
                    );
                    queue_error = true;
                    continue;
                }
            };

            let classified = if result.stderr.is_empty() {
                None
            } else {
                tracing::error!("submit command stderr: {}", result.stderr);
                Some(parse_submit_error(&result.stderr))
            };

            match classified {
                Some((true, message)) => {
                    let mut report = JobReport::new();
                    report.add_error("JobSubmit", 61202, "CondorError", &message);
                    for id in &result.id_list {
                        if let Some(index) = pending.remove(id) {
                            jobs[index].report = Some(report.clone());
                            outcome.failed.push(*id);
                        }
                    }
                }
                _ => {
                    for id in &result.id_list {
                        if pending.remove(id).is_some() {
                            outcome.submitted.push(*id);
                        }
                    }
                }
            }
        }

        if self.config.delete_jdl_files {
            for file in &jdl_files {
                if let Err(err) = fs::remove_file(file) {
                    tracing::warn!("could not remove {}: {}", file, err);
                }
            }
        }

        if queue_error {
            tracing::error!("purging the worker pool after a queue error");
            self.pool.close().await;
        }
        if unbuildable {
            return Err(PluginError::UnbuildableJdl);
        }
        Ok(outcome)
    }

    async fn track(&mut self, jobs: &mut [JobRecord]) -> Result<TrackOutcome, PluginError> {
        let mut outcome = TrackOutcome::default();

        let snapshot = query_class_ads(
            &self.config.query_command,
            &self.config.agent_name,
            self.command_timeout(),
        )
        .await;
        let no_info = snapshot.is_none();
        let ads = snapshot.unwrap_or_default();
        let now = Utc::now().timestamp();
        let grace = self.config.remove_time_secs as i64;

        for job in jobs.iter_mut() {
            match ads.get(&job.jobid) {
                Some(ad) => {
                    let status = status_from_code(ad.job_status);
                    job.global_state = status.global_state();
                    if status != job.status {
                        job.status = status;
                        job.status_time = ad.state_time;
                        outcome.changed.push(job.jobid);
                    }
                    outcome.running.push(job.jobid);
                }
                // A reliable snapshot that simply lacks the job means the
                // scheduler is done with it.
                None if !no_info => outcome.completed.push(job.jobid),
                // The query failed; only age a job out once it has sat in
                // Removed past the grace window.
                None => {
                    if job.status != Status::Removed {
                        job.status = Status::Removed;
                        job.status_time = now;
                        job.global_state = job.status.global_state();
                        outcome.changed.push(job.jobid);
                    } else if now - job.status_time > grace {
                        outcome.completed.push(job.jobid);
                    }
                }
            }
        }

        Ok(outcome)
    }

    async fn complete(&self, jobs: &[JobRecord]) {
        for job in jobs {
            let (Some(cache_dir), Some(retry_count)) = (job.cache_dir.as_deref(), job.retry_count)
            else {
                tracing::error!(
                    "cannot complete job {}: cache_dir {:?}, retry_count {:?}",
                    job.id,
                    job.cache_dir,
                    job.retry_count
                );
                continue;
            };
            let report_path = cache_dir.join(format!("Report.{}.pkl", retry_count));

            let existing_size = fs::metadata(&report_path).map(|m| m.len()).unwrap_or(0);
            if report_path.is_file() && existing_size > 0 {
                // A real report came back with the job.
                continue;
            }
            if report_path.is_dir() {
                tracing::error!(
                    "went to check on the report for job {} and found a directory at {}",
                    job.id,
                    report_path
                );
                continue;
            }

            let mut log_output = String::from("Could not find jobReport\n");
            let log_path = cache_dir.join("condor.log");
            if log_path.is_file() {
                match tail_lines(&log_path, 50) {
                    Ok(tail) => {
                        log_output.push_str("Adding end of condor.log to error message:\n");
                        log_output.push_str(&tail);
                        log_output.push('\n');
                    }
                    Err(err) => tracing::error!("could not read {}: {}", log_path, err),
                }
            }

            let mut report = JobReport::new();
            if !cache_dir.is_dir() {
                tracing::error!(
                    "cache directory vanished under job {}: {}; recreating it for the failure report",
                    job.id,
                    cache_dir
                );
                if let Err(err) = fs::create_dir_all(cache_dir) {
                    tracing::error!("could not recreate {}: {}", cache_dir, err);
                    continue;
                }
                log_output.push_str(&format!("Could not find jobCache directory {}\n", cache_dir));
                report.add_error("NoJobReport", 99304, "NoCacheDir", &log_output);
            } else {
                report.add_error("NoJobReport", 99303, "NoJobReport", &log_output);
            }
            if let Err(err) = report.save(&report_path) {
                tracing::error!("could not write the report for job {}: {}", job.id, err);
            } else {
                tracing::debug!("no returning job report for job {}", job.id);
            }
        }
    }

    async fn kill(&self, jobs: &[JobRecord]) {
        let timeout = self.command_timeout();
        for job in jobs {
            let command = format!(
                "{} -constraint \"WMAgent_JobID =?= {}\"",
                self.config.remove_command, job.jobid
            );
            match run_command(&command, timeout).await {
                Ok(result) if result.exit_code != 0 => tracing::error!(
                    "removal of job {} exited {}: {}",
                    job.jobid,
                    result.exit_code,
                    result.stderr
                ),
                Ok(_) => {}
                Err(err) => tracing::error!("failed to run removal for job {}: {}", job.jobid, err),
            }
        }
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drover_core::{CredentialError, GlobalState, StaticSiteDirectory};
    use tempfile::TempDir;

    fn utf8(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    fn test_config(root: &Utf8Path) -> DroverConfig {
        let mut config = DroverConfig::default();
        config.submit_dir = root.join("submit");
        config.submit_command = "echo".to_string();
        config.query_command = "true".to_string();
        config.remove_command = "true".to_string();
        config.workers = 2;
        config.command_timeout_secs = 10;
        config
    }

    fn plugin_with(config: DroverConfig) -> CondorPlugin {
        CondorPlugin::new(config, Box::new(StaticSiteDirectory::default()), None)
    }

    fn job(jobid: i64, id: i64, root: &Utf8Path, sandbox: &str) -> JobRecord {
        JobRecord {
            jobid,
            id,
            status: Status::New,
            status_time: 0,
            sandbox: root.join(sandbox),
            cache_dir: Some(root.join(format!("cache/job-{}", id))),
            retry_count: Some(0),
            location: Some("T2_US_Example".to_string()),
            possible_sites: Vec::new(),
            priority: None,
            global_state: GlobalState::Pending,
            task_type: None,
            user_dn: None,
            report: None,
        }
    }

    fn jdl_count(dir: &Utf8Path) -> usize {
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("jdl"))
                .count(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_submit_empty_batch_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let mut plugin = plugin_with(test_config(&utf8(&temp)));
        let outcome = plugin.submit(&mut []).await.unwrap();
        assert!(outcome.submitted.is_empty());
        assert!(outcome.failed.is_empty());
        assert!(plugin.pool.is_empty());
    }

    #[tokio::test]
    async fn test_submit_reports_success() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut plugin = plugin_with(test_config(&root));
        let mut jobs = vec![
            job(1, 10, &root, "sandbox-a.tar.bz2"),
            job(2, 20, &root, "sandbox-a.tar.bz2"),
            job(3, 30, &root, "sandbox-b.tar.bz2"),
        ];
        let mut outcome = plugin.submit(&mut jobs).await.unwrap();
        outcome.submitted.sort_unstable();
        assert_eq!(outcome.submitted, vec![10, 20, 30]);
        assert!(outcome.failed.is_empty());
        assert_eq!(plugin.pool.worker_count(), 2);
        // JDL files are cleaned up by default.
        assert_eq!(jdl_count(&plugin.config.submit_dir), 0);
        plugin.close().await;
    }

    #[tokio::test]
    async fn test_submit_classifies_real_errors() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut config = test_config(&root);
        config.submit_command = "drover_test_missing_submit_tool".to_string();
        let mut plugin = plugin_with(config);
        let mut jobs = vec![job(1, 10, &root, "sandbox-a.tar.bz2")];
        let outcome = plugin.submit(&mut jobs).await.unwrap();
        assert!(outcome.submitted.is_empty());
        assert_eq!(outcome.failed, vec![10]);
        let report = jobs[0].report.as_ref().unwrap();
        assert_eq!(report.errors()[0].code, 61202);
        assert_eq!(report.errors()[0].category, "JobSubmit");
        plugin.close().await;
    }

    #[tokio::test]
    async fn test_send_failure_stops_later_batches() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut config = test_config(&root);
        config.workers = 0;
        config.delete_jdl_files = false;
        let mut plugin = plugin_with(config);
        let mut jobs = vec![
            job(1, 10, &root, "sandbox-a.tar.bz2"),
            job(2, 20, &root, "sandbox-b.tar.bz2"),
        ];
        let outcome = plugin.submit(&mut jobs).await.unwrap();
        assert!(outcome.submitted.is_empty());
        assert!(outcome.failed.is_empty());
        // Only the first batch's JDL was ever built; the send failure kept
        // the second batch off the channel entirely.
        assert_eq!(jdl_count(&plugin.config.submit_dir), 1);
        assert!(plugin.pool.is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_delegated_credential() {
        struct FixedProvider;
        impl CredentialProvider for FixedProvider {
            fn fetch(&self, _principal: &str) -> Result<Utf8PathBuf, CredentialError> {
                Ok(Utf8PathBuf::from("/tmp/delegated.proxy"))
            }
        }

        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut config = test_config(&root);
        config.delete_jdl_files = false;
        config.server_cert = Some(root.join("cert.pem"));
        config.server_key = Some(root.join("key.pem"));
        config.myproxy_server = Some("myproxy.example.org".to_string());
        let mut plugin = CondorPlugin::new(
            config,
            Box::new(StaticSiteDirectory::default()),
            Some(Box::new(FixedProvider)),
        );

        let mut jobs = vec![job(1, 10, &root, "sandbox-a.tar.bz2")];
        jobs[0].user_dn = Some("/DC=org/CN=someone".to_string());
        let outcome = plugin.submit(&mut jobs).await.unwrap();
        assert_eq!(outcome.submitted, vec![10]);

        let submit_dir = plugin.config.submit_dir.clone();
        let entry = fs::read_dir(&submit_dir)
            .unwrap()
            .filter_map(Result::ok)
            .find(|e| e.path().extension().and_then(|x| x.to_str()) == Some("jdl"))
            .unwrap();
        let jdl = fs::read_to_string(entry.path()).unwrap();
        assert!(jdl.contains("x509userproxy = /tmp/delegated.proxy"));
        plugin.close().await;
    }

    #[tokio::test]
    async fn test_track_empty_reliable_snapshot_completes() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut plugin = plugin_with(test_config(&root));
        let mut jobs = vec![job(5, 50, &root, "sandbox-a.tar.bz2")];
        jobs[0].status = Status::Running;
        let outcome = plugin.track(&mut jobs).await.unwrap();
        assert_eq!(outcome.completed, vec![5]);
        assert!(outcome.changed.is_empty());
        assert!(outcome.running.is_empty());
    }

    #[tokio::test]
    async fn test_track_failed_query_marks_removed_then_completes() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut config = test_config(&root);
        config.query_command = "false".to_string();
        let mut plugin = plugin_with(config);
        let mut jobs = vec![job(5, 50, &root, "sandbox-a.tar.bz2")];
        jobs[0].status = Status::Idle;

        let outcome = plugin.track(&mut jobs).await.unwrap();
        assert_eq!(outcome.changed, vec![5]);
        assert!(outcome.completed.is_empty());
        assert_eq!(jobs[0].status, Status::Removed);
        assert_eq!(jobs[0].global_state, GlobalState::Running);

        // Still inside the grace window: nothing reported for the job.
        let outcome = plugin.track(&mut jobs).await.unwrap();
        assert!(outcome.changed.is_empty());
        assert!(outcome.completed.is_empty());

        // Age the job past the grace window.
        jobs[0].status_time = Utc::now().timestamp() - 120;
        let outcome = plugin.track(&mut jobs).await.unwrap();
        assert_eq!(outcome.completed, vec![5]);
        assert!(outcome.changed.is_empty());
    }

    #[tokio::test]
    async fn test_track_present_job_reconciles_status() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let script = root.join("fake_query.sh");
        fs::write(
            &script,
            "#!/bin/sh\necho '(JobStatus:4)  (stateTime:1700000000)  (WMAgentID:7):::'\n",
        )
        .unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&script).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&script, perms).unwrap();
        }

        let mut config = test_config(&root);
        config.query_command = script.to_string();
        let mut plugin = plugin_with(config);
        let mut jobs = vec![job(7, 70, &root, "sandbox-a.tar.bz2")];

        let outcome = plugin.track(&mut jobs).await.unwrap();
        assert_eq!(outcome.running, vec![7]);
        assert_eq!(outcome.changed, vec![7]);
        assert!(outcome.completed.is_empty());
        assert_eq!(jobs[0].status, Status::Complete);
        assert_eq!(jobs[0].global_state, GlobalState::Complete);
        assert_eq!(jobs[0].status_time, 1700000000);

        // A second look sees no status movement; the job is still present.
        let outcome = plugin.track(&mut jobs).await.unwrap();
        assert_eq!(outcome.running, vec![7]);
        assert!(outcome.changed.is_empty());
    }

    #[tokio::test]
    async fn test_complete_skips_job_missing_bookkeeping() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let plugin = plugin_with(test_config(&root));
        let mut incomplete = job(1, 10, &root, "sandbox-a.tar.bz2");
        incomplete.cache_dir = None;
        plugin.complete(&[incomplete]).await;
    }

    #[tokio::test]
    async fn test_complete_leaves_existing_report_alone() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let plugin = plugin_with(test_config(&root));
        let j = job(1, 10, &root, "sandbox-a.tar.bz2");
        let cache_dir = j.cache_dir.clone().unwrap();
        fs::create_dir_all(&cache_dir).unwrap();
        let report_path = cache_dir.join("Report.0.pkl");
        fs::write(&report_path, "real report body").unwrap();

        plugin.complete(&[j]).await;
        assert_eq!(fs::read_to_string(&report_path).unwrap(), "real report body");
    }

    #[tokio::test]
    async fn test_complete_synthesizes_missing_report() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let plugin = plugin_with(test_config(&root));
        let j = job(1, 10, &root, "sandbox-a.tar.bz2");
        let cache_dir = j.cache_dir.clone().unwrap();
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join("condor.log"), "line one\nline two\n").unwrap();

        plugin.complete(&[j]).await;

        let report = JobReport::load(&cache_dir.join("Report.0.pkl")).unwrap();
        assert_eq!(report.errors()[0].code, 99303);
        assert_eq!(report.errors()[0].category, "NoJobReport");
        assert!(report.errors()[0]
            .message
            .contains("Adding end of condor.log"));
        assert!(report.errors()[0].message.contains("line two"));
    }

    #[tokio::test]
    async fn test_complete_recreates_vanished_cache_dir() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let plugin = plugin_with(test_config(&root));
        let mut j = job(1, 10, &root, "sandbox-a.tar.bz2");
        j.retry_count = Some(2);
        let cache_dir = j.cache_dir.clone().unwrap();
        assert!(!cache_dir.exists());

        plugin.complete(&[j]).await;

        assert!(cache_dir.is_dir());
        let report = JobReport::load(&cache_dir.join("Report.2.pkl")).unwrap();
        assert_eq!(report.errors()[0].code, 99304);
        assert_eq!(report.errors()[0].kind, "NoCacheDir");
    }

    #[tokio::test]
    async fn test_kill_survives_command_failure() {
        let temp = TempDir::new().unwrap();
        let root = utf8(&temp);
        let mut config = test_config(&root);
        config.remove_command = "false".to_string();
        let plugin = plugin_with(config);
        let jobs = vec![job(1, 10, &root, "sandbox-a.tar.bz2")];
        plugin.kill(&jobs).await;
    }
}
