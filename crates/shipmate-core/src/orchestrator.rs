//! The release state machine.

use std::path::{Path, PathBuf};

use shipmate_changelog::render;
use shipmate_config::{Config, ExecutionMode};
use shipmate_provider::Provider;
use shipmate_versioning::{ReleaseManifest, Version, VersionDecision, VersioningError, classify, decide};
use tracing::{debug, info, warn};

use crate::updates::run_config_updates;
use crate::{Connector, CoreError, CoreResult, RunReport, RunState, Step};

/// Runs one release decision against a provider.
///
/// The run goes through these steps:
/// 1. read the manifest (a missing one means version zero)
/// 2. classify history since the current version and decide the next one
/// 3. if the current version has no release yet, release it and run
///    config updates, then stop
/// 4. otherwise, if there is a next version, ensure its branch, commit the
///    new manifest and ensure the release request
///
/// Every step is idempotent, so a failed run can simply be repeated.
pub struct Orchestrator<'a> {
    config: &'a Config,
    provider: &'a dyn Provider,
    root: PathBuf,
    mode: ExecutionMode,
    connector: Option<&'a dyn Connector>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator reading the manifest from `root`.
    pub fn new(config: &'a Config, provider: &'a dyn Provider, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            provider,
            root: root.into(),
            mode: ExecutionMode::Live,
            connector: None,
        }
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the connector used for config-update jobs.
    #[must_use]
    pub fn connector(mut self, connector: &'a dyn Connector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Returns the manifest directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Step`] naming the step whose provider call
    /// failed, or [`CoreError::ConfigUpdates`] after every config update was
    /// attempted.
    pub fn run(&self) -> CoreResult<RunReport> {
        info!(provider = self.provider.name(), mode = %self.mode, "starting release run");
        let mut warnings = Vec::new();

        let current = self.load_current(&mut warnings);
        let decision = self.decide(&current)?;
        info!(
            current = %decision.current,
            next = %decision.next,
            has_next = decision.has_next,
            "decided version"
        );

        let released = self
            .provider
            .check_release(&decision)
            .map_err(CoreError::at(Step::ReleaseCheck))?;

        if !released {
            return self.first_release(decision, warnings);
        }

        let Some(next) = decision.next_version() else {
            info!(version = %decision.current, "already released, nothing to do");
            return Ok(RunReport {
                decision,
                state: RunState::NothingToDo,
                actions: Vec::new(),
                warnings,
            });
        };

        let mut actions = Vec::new();

        let branch = self
            .provider
            .check_or_create_branch(&self.config.target_branch, next, &self.config.branch_prefix, self.mode)
            .map_err(CoreError::at(Step::Branch))?;
        actions.push(branch.outcome);

        let manifest = ReleaseManifest::new(next.clone());
        let commit = self
            .provider
            .commit_manifest(&branch.name, &manifest, &decision, &self.config.extra_files, self.mode)
            .map_err(CoreError::at(Step::Commit))?;
        actions.push(commit);

        let requests = self
            .provider
            .check_create_release_pull_request(&branch.name, &self.config.target_branch, &decision, self.mode)
            .map_err(CoreError::at(Step::PullRequest))?;
        actions.extend(requests);

        info!(branch = %branch.name, version = %next, "release requested");
        Ok(RunReport {
            decision,
            state: RunState::ReleaseRequested,
            actions,
            warnings,
        })
    }

    fn load_current(&self, warnings: &mut Vec<String>) -> Version {
        let prefix = &self.config.versioning.version_prefix;
        match ReleaseManifest::read_from(&self.root) {
            Ok(manifest) => manifest.version,
            Err(VersioningError::ManifestMissing(path)) => {
                debug!(?path, "no release manifest, starting from zero");
                Version::zero(prefix.clone())
            }
            Err(err) => {
                warn!(error = %err, "could not read release manifest, starting from zero");
                warnings.push(err.to_string());
                Version::zero(prefix.clone())
            }
        }
    }

    fn decide(&self, current: &Version) -> CoreResult<VersionDecision> {
        let commits = self
            .provider
            .commits_since_release(&current.to_string())
            .map_err(CoreError::at(Step::History))?;
        let classified = classify(&commits, &self.config.versioning);
        Ok(decide(current, &classified, &self.config.versioning))
    }

    fn first_release(&self, decision: VersionDecision, mut warnings: Vec<String>) -> CoreResult<RunReport> {
        info!(version = %decision.current, "no release for current version, releasing");

        let previous = self
            .provider
            .highest_release()
            .map_err(CoreError::at(Step::History))?;
        let commits = self
            .provider
            .commits_since_release(&previous.to_string())
            .map_err(CoreError::at(Step::History))?;
        let description = render(&commits, &self.config.project_url);

        let mut actions = self
            .provider
            .create_release(&self.config.target_branch, &decision, &description, self.mode)
            .map_err(CoreError::at(Step::Release))?;

        if !self.config.config_updates.is_empty() {
            match self.connector {
                Some(connector) => actions.extend(run_config_updates(
                    connector,
                    &self.config.config_updates,
                    &decision.current,
                    &self.config.target_branch,
                    self.mode,
                )?),
                None => {
                    warn!("config updates configured but no connector available");
                    warnings.push("config updates skipped: no connector".to_string());
                }
            }
        }

        Ok(RunReport {
            decision,
            state: RunState::FirstRelease,
            actions,
            warnings,
        })
    }
}
