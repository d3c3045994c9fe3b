//! Translation orchestration: plan, dispatch, merge, write, report.
//!
//! One invocation translates one source resource into every configured target
//! locale. Provider calls for all targets share a single concurrency bound and
//! each call has its own timeout. Merging walks results in plan order, so the
//! written files do not depend on the order in which calls complete.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    pin::pin,
    sync::Arc,
    time::Duration,
};

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    codec::codec_for_path,
    config::{ConfigStore, TranslateConfig},
    error::{Error, ErrorKind, ProviderError},
    fs::FileSystem,
    lock::TargetLockRegistry,
    policy::{self, MergeOutcome},
    provider::TranslationProvider,
    report::{InvocationReport, KeyFailure, Stage, TargetReport},
    resolver::{resolve_targets, source_locale_of},
    traits::ResourceCodec,
    types::{
        LocaleTag, Outcome, OverwritePolicy, ResourceDocument, TargetFileSpec, TranslationResult,
        TranslationUnit,
    },
};

/// Locale assumed for a source file whose name carries none and whose
/// configuration names none.
pub const FALLBACK_SOURCE_LOCALE: &str = "en";

/// Cancels an invocation from another task.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        CancelToken { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only errors if it is
        // dropped, which cannot happen while borrowed.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// The work planned for one target.
#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub spec: TargetFileSpec,
    pub document: ResourceDocument,
    pub units: Vec<TranslationUnit>,
    pub decode_error: Option<String>,
}

/// Everything decided before any provider call.
#[derive(Debug, Clone)]
pub struct InvocationPlan {
    pub source_path: PathBuf,
    pub source_locale: LocaleTag,
    pub policy: OverwritePolicy,
    pub source: ResourceDocument,
    pub targets: Vec<TargetPlan>,
}

impl InvocationPlan {
    pub fn unit_count(&self) -> usize {
        self.targets.iter().map(|t| t.units.len()).sum()
    }
}

struct Prepared {
    config: TranslateConfig,
    codec: Box<dyn ResourceCodec>,
    source_path: PathBuf,
    source_locale: LocaleTag,
    source: ResourceDocument,
    specs: Vec<TargetFileSpec>,
}

/// Runs translation invocations against a provider and a file system.
pub struct Orchestrator {
    provider: Arc<dyn TranslationProvider>,
    fs: Arc<dyn FileSystem>,
    config: Arc<dyn ConfigStore>,
    locks: Arc<TargetLockRegistry>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        fs: Arc<dyn FileSystem>,
        config: Arc<dyn ConfigStore>,
    ) -> Self {
        Orchestrator {
            provider,
            fs,
            config,
            locks: TargetLockRegistry::global(),
        }
    }

    /// Uses `registry` instead of the process-wide lock registry.
    pub fn with_lock_registry(mut self, registry: Arc<TargetLockRegistry>) -> Self {
        self.locks = registry;
        self
    }

    /// Plans an invocation without calling the provider, taking locks or
    /// writing anything.
    pub fn plan(&self, source: &Path) -> Result<InvocationPlan, Error> {
        let prepared = self.prepare(source)?;
        Ok(self.plan_targets(prepared).1)
    }

    /// Translates `source` into every configured target locale.
    ///
    /// Returns `Err` only when the invocation cannot start: invalid
    /// configuration, or a source file that cannot be read or decoded
    /// ([`Error::Aborted`]). Every other failure is scoped to a unit or a
    /// target and is listed in the returned report.
    pub async fn translate(
        &self,
        source: &Path,
        cancel: &CancelToken,
    ) -> Result<InvocationReport, Error> {
        debug!(stage = %Stage::Planning, source = %source.display(), "starting invocation");
        let prepared = self.prepare(source)?;

        let target_paths: Vec<PathBuf> = prepared.specs.iter().map(|s| s.path.clone()).collect();
        let acquire = Arc::clone(&self.locks).acquire(target_paths.iter().map(PathBuf::as_path));
        let locks = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            locks = acquire => Some(locks),
        };
        let Some(locks) = locks else {
            warn!("invocation cancelled while waiting for target locks");
            let targets = prepared
                .specs
                .iter()
                .map(|spec| {
                    let mut report = TargetReport::new(spec.locale.clone(), spec.path.clone());
                    report.failed_keys = prepared
                        .source
                        .keys()
                        .map(|key| KeyFailure {
                            key: key.to_string(),
                            kind: ErrorKind::Cancelled,
                            message: "invocation cancelled while waiting for target locks"
                                .to_string(),
                        })
                        .collect();
                    (spec.locale.clone(), report)
                })
                .collect();
            return Ok(InvocationReport::finish(
                prepared.source_path,
                prepared.source_locale,
                prepared.config.policy,
                targets,
                true,
            ));
        };

        let timeout = prepared.config.timeout();
        let limit = self.concurrency_limit(&prepared.config);
        let (codec, plan) = self.plan_targets(prepared);

        debug!(
            stage = %Stage::Dispatching,
            units = plan.unit_count(),
            limit,
            provider = self.provider.name(),
            "dispatching translation units"
        );
        let (mut outcomes, cancelled) = self.dispatch(&plan, limit, timeout, cancel).await;

        let mut reports = BTreeMap::new();
        let mut merged_targets = Vec::with_capacity(plan.targets.len());
        for (t, target) in plan.targets.into_iter().enumerate() {
            let mut report =
                TargetReport::new(target.spec.locale.clone(), target.spec.path.clone());
            report.planned = target.units.len();
            report.decode_error = target.decode_error;

            let results: Vec<TranslationResult> = target
                .units
                .into_iter()
                .enumerate()
                .map(|(u, unit)| {
                    let outcome = outcomes.remove(&(t, u)).unwrap_or_else(|| {
                        Outcome::Failure(ProviderError::new(
                            ErrorKind::Cancelled,
                            "invocation cancelled before the call completed",
                        ))
                    });
                    TranslationResult { unit, outcome }
                })
                .collect();

            if cancelled {
                // Nothing is merged or written once the run is cancelled.
                report.failed_keys = results.iter().map(cancelled_failure).collect();
                reports.insert(report.locale.clone(), report);
                continue;
            }

            debug!(stage = %Stage::Merging, locale = %report.locale, "merging results");
            let (merged, outcome) = policy::apply(target.document, &plan.source, &results);
            merged_targets.push((report.locale.clone(), merged, outcome));
            reports.insert(report.locale.clone(), report);
        }

        let mut cancelled = cancelled;
        for (locale, merged, outcome) in merged_targets {
            let Some(report) = reports.get_mut(&locale) else {
                continue;
            };
            let MergeOutcome {
                succeeded,
                failed,
                changed,
            } = outcome;
            report.failed_keys = failed;

            if cancel.is_cancelled() {
                cancelled = true;
                report
                    .failed_keys
                    .extend(succeeded.into_iter().map(|key| KeyFailure {
                        key,
                        kind: ErrorKind::Cancelled,
                        message: "invocation cancelled before the file was written".to_string(),
                    }));
                continue;
            }
            report.succeeded_keys = succeeded;

            if report.planned == 0 || !changed {
                continue;
            }

            debug!(stage = %Stage::Writing, path = %report.path.display(), "writing target");
            let written = codec
                .encode(&merged)
                .and_then(|bytes| self.fs.write(&report.path, &bytes).map_err(Error::Io));
            match written {
                Ok(()) => report.written = true,
                Err(e) => {
                    warn!(path = %report.path.display(), error = %e, "failed to write target");
                    report.write_error = Some(e.to_string());
                }
            }
        }
        drop(locks);

        let report = InvocationReport::finish(
            plan.source_path,
            plan.source_locale,
            plan.policy,
            reports,
            cancelled,
        );
        info!(
            stage = %report.stage(),
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            cancelled = report.cancelled,
            "invocation finished"
        );
        Ok(report)
    }

    fn concurrency_limit(&self, config: &TranslateConfig) -> usize {
        let hint = self.provider.max_concurrency().unwrap_or(usize::MAX);
        config.concurrency.min(hint).max(1)
    }

    fn prepare(&self, source: &Path) -> Result<Prepared, Error> {
        let config = self.config.load()?;
        config.validate()?;

        let codec =
            codec_for_path(source, config.charset).map_err(|e| Error::aborted(source, e))?;
        let bytes = self
            .fs
            .read(source)
            .map_err(|e| Error::aborted(source, Error::Io(e)))?;
        let document = codec.decode(&bytes).map_err(|e| Error::aborted(source, e))?;

        let source_locale = match config.source_locale.clone().or_else(|| source_locale_of(source))
        {
            Some(locale) => locale,
            None => {
                debug!(
                    source = %source.display(),
                    "no source locale configured or in file name, assuming {}",
                    FALLBACK_SOURCE_LOCALE
                );
                LocaleTag::parse(FALLBACK_SOURCE_LOCALE)?
            }
        };

        let specs = resolve_targets(
            source,
            &source_locale,
            &config.target_locales,
            self.fs.as_ref(),
        )?;

        Ok(Prepared {
            config,
            codec,
            source_path: source.to_path_buf(),
            source_locale,
            source: document,
            specs,
        })
    }

    fn plan_targets(&self, prepared: Prepared) -> (Box<dyn ResourceCodec>, InvocationPlan) {
        let Prepared {
            config,
            codec,
            source_path,
            source_locale,
            source,
            specs,
        } = prepared;

        let targets = specs
            .into_iter()
            .map(|mut spec| {
                // Check again: another invocation may have created the file
                // while this one waited for its locks.
                spec.exists_on_disk = self.fs.exists(&spec.path);
                let (document, decode_error) = self.read_target(codec.as_ref(), &spec);
                let units = policy::plan_work(
                    &source,
                    &document,
                    &source_locale,
                    &spec.locale,
                    config.policy,
                );
                TargetPlan {
                    spec,
                    document,
                    units,
                    decode_error,
                }
            })
            .collect();

        let plan = InvocationPlan {
            source_path,
            source_locale,
            policy: config.policy,
            source,
            targets,
        };
        (codec, plan)
    }

    /// Reads an existing target; anything unreadable counts as empty.
    fn read_target(
        &self,
        codec: &dyn ResourceCodec,
        spec: &TargetFileSpec,
    ) -> (ResourceDocument, Option<String>) {
        if !spec.exists_on_disk {
            return (ResourceDocument::new(), None);
        }
        let decoded = self
            .fs
            .read(&spec.path)
            .map_err(Error::Io)
            .and_then(|bytes| codec.decode(&bytes));
        match decoded {
            Ok(document) => (document, None),
            Err(e) => {
                warn!(
                    path = %spec.path.display(),
                    error = %e,
                    "target could not be decoded, treating it as empty"
                );
                (ResourceDocument::new(), Some(e.to_string()))
            }
        }
    }

    /// Runs every unit of `plan` through the provider with at most `limit`
    /// calls in flight. Returns outcomes keyed by (target, unit) index and
    /// whether the run was cancelled.
    async fn dispatch(
        &self,
        plan: &InvocationPlan,
        limit: usize,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> (HashMap<(usize, usize), Outcome>, bool) {
        let work: Vec<(usize, usize, TranslationUnit)> = plan
            .targets
            .iter()
            .enumerate()
            .flat_map(|(t, target)| {
                target
                    .units
                    .iter()
                    .enumerate()
                    .map(move |(u, unit)| (t, u, unit.clone()))
            })
            .collect();

        let calls = futures::stream::iter(work.into_iter().map(|(t, u, unit)| {
            let provider = Arc::clone(&self.provider);
            async move {
                let outcome = call_provider(provider.as_ref(), &unit, timeout).await;
                if let Outcome::Failure(err) = &outcome {
                    warn!(
                        key = %unit.key,
                        locale = %unit.target_locale,
                        kind = %err.kind,
                        message = %err.message,
                        "translation failed"
                    );
                }
                (t, u, outcome)
            }
        }))
        .buffer_unordered(limit);
        let mut calls = pin!(calls);

        let mut outcomes = HashMap::new();
        let cancelled = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break true,
                next = calls.next() => match next {
                    Some((t, u, outcome)) => {
                        outcomes.insert((t, u), outcome);
                    }
                    None => break false,
                },
            }
        };
        if cancelled {
            warn!(
                completed = outcomes.len(),
                "invocation cancelled, abandoning in-flight calls"
            );
        }
        (outcomes, cancelled)
    }
}

async fn call_provider(
    provider: &dyn TranslationProvider,
    unit: &TranslationUnit,
    timeout: Duration,
) -> Outcome {
    // Blank sources are copied through; providers reject empty input.
    if unit.source_text.trim().is_empty() {
        return Outcome::Success {
            text: unit.source_text.clone(),
        };
    }
    let call = provider.translate(
        &unit.source_text,
        &unit.source_locale,
        &unit.target_locale,
        timeout,
    );
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.into(),
        Err(_) => Outcome::Failure(ProviderError::new(
            ErrorKind::Timeout,
            format!("no response within {} ms", timeout.as_millis()),
        )),
    }
}

fn cancelled_failure(result: &TranslationResult) -> KeyFailure {
    match &result.outcome {
        Outcome::Failure(err) => KeyFailure {
            key: result.unit.key.clone(),
            kind: err.kind,
            message: err.message.clone(),
        },
        Outcome::Success { .. } => KeyFailure {
            key: result.unit.key.clone(),
            kind: ErrorKind::Cancelled,
            message: "invocation cancelled before the result was merged".to_string(),
        },
    }
}
