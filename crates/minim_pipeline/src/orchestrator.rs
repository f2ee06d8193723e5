//! The build driver.
//!
//! A build runs COLLECT → FILTER → SCHEDULE → MERGE → FINALIZE:
//!
//! 1. Snapshot the host's assets and keep the ones the rules select.
//! 2. Derive each asset's cache key; serve hits directly and submit misses
//!    to the worker pool, where identical keys coalesce into one call.
//! 3. Wait for every task, then walk the assets in FILTER order building
//!    diagnostics and composing source maps.
//! 4. Write replacements and comment files back in one pass. Nothing is
//!    written if the build is aborted.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use minim_cache::{
    CacheEntry, CacheKey, CacheKeyInputs, CacheStore, CoalescingCache, DiskCache, Lookup,
};
use minim_config::MinimConfig;
use minim_diagnostics::{
    build_error, build_warning, Diagnostic, DiagnosticCode, PathShortener, RawMinifyError,
};
use minim_sourcemap::{build_source_map, compose, SourceMap};
use serde_json::Value;

use crate::asset::{Asset, AssetSet};
use crate::comments::{banner_for, comments_filename, render_comments};
use crate::error::PipelineError;
use crate::filter::select_assets;
use crate::minifier::{Minifier, MinifyOutput};
use crate::options::MinifyOptions;
use crate::pool::{AbortHandle, TaskHandle, TaskId, TaskOutcome, WorkerPool};
use crate::report::BuildReport;

/// This pipeline's version, folded into every cache key.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Decides whether a raw warning is reported: `(text, asset name)`.
pub type WarningFilter = dyn Fn(&str, Option<&str>) -> bool + Send + Sync;

/// Supplies extra cache key material for an asset name.
pub type CacheKeysHook = dyn Fn(&str) -> BTreeMap<String, String> + Send + Sync;

type Shortener = dyn PathShortener + Send + Sync;
type TaskResult = (Arc<CacheEntry>, Lookup);

/// Drives builds over a host asset set.
pub struct Orchestrator {
    minifier: Arc<dyn Minifier>,
    options: MinifyOptions,
    pool: WorkerPool,
    cache: Arc<CoalescingCache<RawMinifyError>>,
    shortener: Option<Box<Shortener>>,
    warning_filter: Option<Box<WarningFilter>>,
    cache_keys: Option<Box<CacheKeysHook>>,
}

enum Pending {
    Ready(Arc<CacheEntry>),
    Task(TaskHandle<TaskResult>),
}

enum Resolved {
    Entry(Arc<CacheEntry>),
    Failed(RawMinifyError, DiagnosticCode),
}

/// One selected asset carried from SCHEDULE to FINALIZE.
struct Slot {
    name: String,
    input_map: Option<SourceMap>,
    notes: Vec<Diagnostic>,
    pending: Pending,
}

impl Orchestrator {
    /// Creates an orchestrator without a cache store.
    ///
    /// Concurrent tasks for identical content still coalesce within a build.
    pub fn new(minifier: Arc<dyn Minifier>, options: MinifyOptions) -> Result<Self, PipelineError> {
        let pool = WorkerPool::from_parallelism(options.parallel)?;
        Ok(Self {
            minifier,
            options,
            pool,
            cache: Arc::new(CoalescingCache::new(None)),
            shortener: None,
            warning_filter: None,
            cache_keys: None,
        })
    }

    /// Creates an orchestrator from a loaded `minim.toml`.
    ///
    /// A relative cache directory is resolved against `root`. If the disk
    /// cache cannot be opened the build runs uncached.
    pub fn from_config(
        minifier: Arc<dyn Minifier>,
        config: &MinimConfig,
        root: &Path,
    ) -> Result<Self, PipelineError> {
        let orchestrator = Self::new(minifier, MinifyOptions::from_config(config)?)?;
        if !config.cache.enabled {
            return Ok(orchestrator);
        }

        let dir = root.join(config.cache.dir());
        match DiskCache::open(&dir, TOOL_VERSION) {
            Ok(disk) => Ok(orchestrator.with_store(Arc::new(disk))),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cache unavailable, building uncached");
                Ok(orchestrator)
            }
        }
    }

    /// Uses `store` for results, coalescing in front of it.
    pub fn with_store(self, store: Arc<dyn CacheStore>) -> Self {
        self.with_cache(Arc::new(CoalescingCache::new(Some(store))))
    }

    /// Shares an existing coalescing cache, for instance across orchestrators.
    pub fn with_cache(mut self, cache: Arc<CoalescingCache<RawMinifyError>>) -> Self {
        self.cache = cache;
        self
    }

    /// Shortens original source paths in diagnostic messages.
    pub fn with_shortener(mut self, shortener: impl PathShortener + Send + Sync + 'static) -> Self {
        self.shortener = Some(Box::new(shortener));
        self
    }

    /// Drops minifier warnings the predicate rejects.
    pub fn with_warning_filter(
        mut self,
        filter: impl Fn(&str, Option<&str>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.warning_filter = Some(Box::new(filter));
        self
    }

    /// Adds per-asset material to cache keys.
    pub fn with_cache_keys(
        mut self,
        hook: impl Fn(&str) -> BTreeMap<String, String> + Send + Sync + 'static,
    ) -> Self {
        self.cache_keys = Some(Box::new(hook));
        self
    }

    /// The options this orchestrator builds with.
    pub fn options(&self) -> &MinifyOptions {
        &self.options
    }

    /// A handle that aborts the running build.
    ///
    /// Once aborted, builds fail with [`PipelineError::Aborted`] until the
    /// handle is [reset](AbortHandle::reset).
    pub fn abort_handle(&self) -> AbortHandle {
        self.pool.abort_handle()
    }

    /// Minifies the selected assets of `assets` in place.
    ///
    /// Per-asset failures are reported in the returned [`BuildReport`] and
    /// leave that asset untouched. Returns [`PipelineError::Aborted`] if the
    /// build is aborted before results are written; `assets` is then
    /// unchanged.
    pub fn run(&self, assets: &mut dyn AssetSet) -> Result<BuildReport, PipelineError> {
        let abort = self.pool.abort_handle();
        let mut report = BuildReport::default();

        let selected = select_assets(assets, &self.options.rules);
        report.stats.eligible = selected.len();
        tracing::debug!(eligible = selected.len(), "assets selected");

        let minifier_options = Arc::new(self.options.effective_minifier_options());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut slots = Vec::with_capacity(selected.len());
        for (index, (name, asset)) in selected.into_iter().enumerate() {
            let (input_map, notes) = self.input_map(&name, &asset);
            let key = self.cache_key(&name, &asset.content, &minifier_options);
            let pending = match self.cache.get(&key) {
                Some(entry) => {
                    tracing::debug!(asset = %name, %key, "cache hit");
                    report.stats.cache_hits += 1;
                    Pending::Ready(entry)
                }
                None => {
                    tracing::debug!(asset = %name, %key, "scheduling");
                    Pending::Task(self.submit(TaskId(index), key, asset, &minifier_options, &calls))
                }
            };
            slots.push(Slot {
                name,
                input_map,
                notes,
                pending,
            });
        }

        let mut resolved = Vec::with_capacity(slots.len());
        for slot in slots {
            let result = match slot.pending {
                Pending::Ready(entry) => Some(Resolved::Entry(entry)),
                Pending::Task(handle) => match handle.wait() {
                    TaskOutcome::Completed((entry, lookup)) => {
                        if lookup == Lookup::Hit {
                            report.stats.cache_hits += 1;
                        }
                        Some(Resolved::Entry(entry))
                    }
                    TaskOutcome::Failed(raw) => {
                        Some(Resolved::Failed(raw, DiagnosticCode::MINIFY_FAILED))
                    }
                    TaskOutcome::Panicked(raw) => {
                        Some(Resolved::Failed(raw, DiagnosticCode::MINIFIER_PANICKED))
                    }
                    TaskOutcome::Abandoned => None,
                },
            };
            resolved.push((slot.name, slot.input_map, slot.notes, result));
        }
        report.stats.minifier_calls = calls.load(Ordering::SeqCst);

        if abort.is_aborted() || resolved.iter().any(|(.., r)| r.is_none()) {
            tracing::info!("build aborted, no assets written");
            return Err(PipelineError::Aborted);
        }

        let mut replacements: Vec<(String, Asset)> = Vec::new();
        let mut comment_files: Vec<(String, Vec<String>)> = Vec::new();

        for (name, input_map, notes, result) in resolved {
            for note in notes {
                report.push(note);
            }
            let entry = match result {
                Some(Resolved::Entry(entry)) => entry,
                Some(Resolved::Failed(raw, code)) => {
                    report.stats.failed += 1;
                    let diag = build_error(&raw, &name, input_map.as_ref(), self.shortener())
                        .with_code(code);
                    tracing::debug!(asset = %name, "minification failed");
                    report.push(diag);
                    continue;
                }
                None => continue,
            };

            for text in &entry.warnings {
                let filter = self
                    .warning_filter
                    .as_deref()
                    .map(|f| f as &dyn Fn(&str, Option<&str>) -> bool);
                if let Some(diag) =
                    build_warning(text, Some(&name), input_map.as_ref(), self.shortener(), filter)
                {
                    report.push(diag);
                }
            }

            let mut code = entry.code.clone();
            let mut map = self.output_map(&name, &entry, input_map.as_ref());

            if let Some(extract) = &self.options.extract_comments {
                if !entry.extracted_comments.is_empty() {
                    let target = comments_filename(&extract.filename, &name);
                    if target == name || assets.contains(&target) {
                        report.push(
                            Diagnostic::warning(
                                DiagnosticCode::COMMENTS_CONFLICT,
                                format!(
                                    "The comment file \"{target}\" conflicts with an existing asset, \
                                     this may lead to code corruption, please use a different name"
                                ),
                            )
                            .with_file(name.as_str()),
                        );
                    } else {
                        if let Some(banner) = banner_for(&extract.banner, &name, &target) {
                            let offset = banner.lines().count();
                            code = format!("{banner}\n{code}");
                            map = map.map(|m| m.with_line_offset(offset));
                        }
                        match comment_files.iter_mut().find(|(t, _)| *t == target) {
                            Some((_, comments)) => {
                                comments.extend(entry.extracted_comments.iter().cloned())
                            }
                            None => {
                                comment_files.push((target, entry.extracted_comments.clone()))
                            }
                        }
                    }
                }
            }

            let source_map = map.and_then(|m| match m.to_value() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(asset = %name, error = %e, "could not serialize source map");
                    None
                }
            });
            replacements.push((
                name,
                Asset {
                    content: code,
                    source_map,
                    minimized: true,
                },
            ));
        }

        if abort.is_aborted() {
            tracing::info!("build aborted, no assets written");
            return Err(PipelineError::Aborted);
        }

        for (name, asset) in replacements {
            assets.replace(&name, asset);
        }
        for (target, comments) in comment_files {
            // Already-minified so a later build never feeds it to the minifier.
            let asset = Asset {
                content: render_comments(&comments),
                source_map: None,
                minimized: true,
            };
            if assets.insert(&target, asset) {
                report.stats.comment_files += 1;
            }
        }

        if let Some(store) = self.cache.store() {
            if let Err(e) = store.flush() {
                tracing::warn!(error = %e, "cache flush failed");
            }
        }

        tracing::info!(
            eligible = report.stats.eligible,
            cache_hits = report.stats.cache_hits,
            minifier_calls = report.stats.minifier_calls,
            failed = report.stats.failed,
            warnings = report.warnings.len(),
            "build finished"
        );
        Ok(report)
    }

    fn shortener(&self) -> Option<&dyn PathShortener> {
        self.shortener.as_deref().map(|s| s as &dyn PathShortener)
    }

    /// The asset's own map when maps are enabled, plus a warning if it was
    /// present but unusable.
    fn input_map(&self, name: &str, asset: &Asset) -> (Option<SourceMap>, Vec<Diagnostic>) {
        if !self.options.source_map {
            return (None, Vec::new());
        }
        let Some(raw) = asset.source_map.as_ref() else {
            return (None, Vec::new());
        };
        match build_source_map(Some(raw)) {
            Some(map) => (Some(map), Vec::new()),
            None => {
                let note = Diagnostic::warning(
                    DiagnosticCode::INVALID_SOURCE_MAP,
                    format!("{name} contains invalid source map"),
                )
                .with_file(name);
                (None, vec![note])
            }
        }
    }

    fn cache_key(&self, name: &str, source: &str, options: &Value) -> CacheKey {
        let extra = self
            .cache_keys
            .as_ref()
            .map(|hook| hook(name))
            .unwrap_or_default();
        CacheKey::derive(&CacheKeyInputs {
            source,
            options,
            minifier_name: self.minifier.name(),
            minifier_version: self.minifier.version(),
            tool_version: TOOL_VERSION,
            source_map: self.options.source_map,
            extra,
        })
    }

    fn submit(
        &self,
        id: TaskId,
        key: CacheKey,
        asset: Asset,
        options: &Arc<Value>,
        calls: &Arc<AtomicUsize>,
    ) -> TaskHandle<TaskResult> {
        let cache = Arc::clone(&self.cache);
        let minifier = Arc::clone(&self.minifier);
        let options = Arc::clone(options);
        let calls = Arc::clone(calls);
        let source = asset.content;

        self.pool.submit(id, move || {
            let resolution = cache.get_or_compute(&key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                minifier.minify(&source, &options).map(into_entry)
            });
            let lookup = resolution.lookup;
            resolution.outcome.map(|entry| (entry, lookup))
        })
    }

    /// The map to store with the minified asset: the minifier's map traced
    /// through the asset's own map when it had one.
    fn output_map(
        &self,
        name: &str,
        entry: &CacheEntry,
        input: Option<&SourceMap>,
    ) -> Option<SourceMap> {
        if !self.options.source_map {
            return None;
        }
        let json = entry.map.as_deref()?;
        let output = serde_json::from_str::<Value>(json)
            .ok()
            .and_then(|value| build_source_map(Some(&value)));
        let Some(output) = output else {
            tracing::debug!(asset = %name, "minifier produced an unusable source map");
            return None;
        };
        Some(match input {
            Some(input) => compose(input, &output),
            None => output,
        })
    }
}

fn into_entry(output: MinifyOutput) -> CacheEntry {
    CacheEntry {
        code: output.code,
        map: output.map.map(|m| m.to_string()),
        warnings: output.warnings,
        extracted_comments: output.extracted_comments,
    }
}
