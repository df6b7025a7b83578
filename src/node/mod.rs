//! The build-graph node that materializes generated headers.
//!
//! A [`BuildGraphNode`] owns a table of [`GenerationTarget`]s and turns each
//! into a header on disk, either by running the generator or by copying a
//! prebuilt fallback. Targets never read one another's outputs, so they run
//! in parallel on a bounded pool of worker threads.
//!
//! # Examples
//!
//! ```no_run
//! use packgen::generator::GeneratorInvoker;
//! use packgen::node::{BuildGraphNode, MaterializeOptions};
//! use packgen::resolver::ResolverConfig;
//! use packgen::target::GenerationTarget;
//!
//! let targets = ["21", "42"].map(|v| {
//!     GenerationTarget::new(format!("v{v}"), format!("build/cle/v{v}.h"), v)
//!         .with_generator("gen_pack_header.py", "v3d_packet.xml")
//! });
//! let mut node = BuildGraphNode::new(
//!     targets,
//!     ["include".into()],
//!     ResolverConfig::default(),
//!     GeneratorInvoker::new(Some("python3".into())),
//! )?;
//! node.materialize(&MaterializeOptions::default())?;
//! assert_eq!(node.exported_include_dirs(), ["build/cle", "include"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use camino::Utf8PathBuf;
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactDigest, PersistedArtifact, WriteOutcome};
use crate::cancel::CancellationToken;
use crate::error::{MaterializeError, NodeError, TargetError};
use crate::fallback::FallbackCopier;
use crate::generator::{GeneratorInvoker, GeneratorRequest};
use crate::resolver::{ArtifactResolver, Plan, ResolverConfig};
use crate::target::{GenerationTarget, Strategy};

mod pool;

/// Lifecycle of a target within one build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// Not yet started.
    Pending,
    /// Currently being generated or copied.
    InProgress,
    /// Output written (or confirmed unchanged).
    Materialized,
    /// Failed; not retried within this invocation.
    Failed,
}

/// Knobs for one `materialize()` call.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Maximum number of targets processed at once. Defaults to the host's
    /// available parallelism.
    pub jobs: Option<NonZeroUsize>,
    /// Token that aborts the build when cancelled.
    pub cancel: CancellationToken,
}

/// A successfully materialized target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedOutput {
    /// Logical target name.
    pub name: String,
    /// Strategy that produced the header.
    pub strategy: Strategy,
    /// Header path.
    pub output: Utf8PathBuf,
    /// Digest of the header content.
    pub digest: ArtifactDigest,
    /// Whether the file on disk was rewritten.
    pub outcome: WriteOutcome,
}

/// Outcome of a fully successful `materialize()` call, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// One entry per target.
    pub outputs: Vec<MaterializedOutput>,
}

impl MaterializeReport {
    /// Number of headers whose content changed on disk.
    #[must_use]
    pub fn written(&self) -> usize {
        self.outputs
            .iter()
            .filter(|out| out.outcome == WriteOutcome::Written)
            .count()
    }
}

/// Owns a set of generation targets and the include roots they export.
#[derive(Debug)]
pub struct BuildGraphNode {
    targets: Vec<GenerationTarget>,
    include_roots: IndexSet<Utf8PathBuf>,
    resolver: ArtifactResolver,
    invoker: GeneratorInvoker,
    states: Mutex<Vec<TargetState>>,
}

struct Work<'a> {
    index: usize,
    target: &'a GenerationTarget,
    plan: Plan<'a>,
}

impl BuildGraphNode {
    /// Assemble a node for one build configuration.
    ///
    /// `include_roots` are statically exported directories, such as one
    /// holding hand-written headers next to the generated ones. Duplicates
    /// are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::NoTargets`] for an empty target list and
    /// [`NodeError::DuplicateOutput`] when two targets share an output path.
    pub fn new(
        targets: impl IntoIterator<Item = GenerationTarget>,
        include_roots: impl IntoIterator<Item = Utf8PathBuf>,
        config: ResolverConfig,
        invoker: GeneratorInvoker,
    ) -> Result<Self, NodeError> {
        let targets: Vec<GenerationTarget> = targets.into_iter().collect();
        if targets.is_empty() {
            return Err(NodeError::NoTargets);
        }
        check_unique_outputs(&targets)?;

        let states = Mutex::new(vec![TargetState::Pending; targets.len()]);
        Ok(Self {
            targets,
            include_roots: include_roots.into_iter().collect(),
            resolver: ArtifactResolver::new(config),
            invoker,
            states,
        })
    }

    /// Targets in declaration order.
    #[must_use]
    pub fn targets(&self) -> &[GenerationTarget] {
        &self.targets
    }

    /// Resolver applied to every target.
    #[must_use]
    pub const fn resolver(&self) -> &ArtifactResolver {
        &self.resolver
    }

    /// Invoker used for generated targets.
    #[must_use]
    pub const fn invoker(&self) -> &GeneratorInvoker {
        &self.invoker
    }

    /// Current state of the target called `name`.
    #[must_use]
    pub fn target_state(&self, name: &str) -> Option<TargetState> {
        let index = self.targets.iter().position(|t| t.name == name)?;
        self.lock_states().get(index).copied()
    }

    /// Produce every target's header.
    ///
    /// Each call is a fresh build invocation: all targets start from
    /// [`TargetState::Pending`]. The exclusive borrow keeps one invocation
    /// per node at a time. Strategies are resolved for every target before
    /// any I/O happens; a target that cannot be resolved never runs. The
    /// remaining targets run in parallel, bounded by
    /// [`MaterializeOptions::jobs`]. A failure never stops sibling targets.
    ///
    /// A failed target's output path is cleared, so a header from an earlier
    /// build never survives next to a [`TargetState::Failed`] state.
    ///
    /// # Errors
    ///
    /// Returns a [`MaterializeError`] holding one [`TargetError`] per failed
    /// target. Successful siblings keep their outputs.
    pub fn materialize(
        &mut self,
        options: &MaterializeOptions,
    ) -> Result<MaterializeReport, MaterializeError> {
        self.reset_states();
        let node = &*self;

        let mut failures: Vec<(usize, TargetError)> = Vec::new();
        let mut work = Vec::with_capacity(node.targets.len());
        for (index, target) in node.targets.iter().enumerate() {
            match node.resolver.plan(target) {
                Ok(plan) => work.push(Work {
                    index,
                    target,
                    plan,
                }),
                Err(err) => {
                    warn!(header = %target.name, error = %err, "target has no strategy");
                    node.set_state(index, TargetState::Failed);
                    failures.push((index, err));
                }
            }
        }
        for (index, _) in &failures {
            if let Some(target) = node.targets.get(*index) {
                discard_stale_output(target);
            }
        }

        let jobs = options.jobs.map_or_else(default_jobs, NonZeroUsize::get);
        debug!(targets = work.len(), jobs, "materializing targets");
        let results = pool::run_all(&work, jobs, |item| {
            (item.index, node.materialize_one(item, &options.cancel))
        });

        let mut outputs = Vec::with_capacity(results.len());
        for (index, result) in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(err) => failures.push((index, err)),
            }
        }

        if failures.is_empty() {
            Ok(MaterializeReport { outputs })
        } else {
            failures.sort_by_key(|(index, _)| *index);
            Err(MaterializeError {
                total: node.targets.len(),
                failures: failures.into_iter().map(|(_, err)| err).collect(),
            })
        }
    }

    /// Include directories for downstream compilation.
    ///
    /// Lists the directory of every materialized output in declaration
    /// order, then the static include roots, without duplicates.
    #[must_use]
    pub fn exported_include_dirs(&self) -> Vec<Utf8PathBuf> {
        let states = self.lock_states();
        let materialized = self
            .targets
            .iter()
            .zip(states.iter())
            .filter(|(_, state)| **state == TargetState::Materialized)
            .map(|(target, _)| target);
        Self::collect_dirs(materialized, &self.include_roots)
    }

    /// Include directories the node would export once every target has
    /// materialized.
    #[must_use]
    pub fn declared_include_dirs(&self) -> Vec<Utf8PathBuf> {
        Self::collect_dirs(self.targets.iter(), &self.include_roots)
    }

    fn collect_dirs<'a>(
        targets: impl Iterator<Item = &'a GenerationTarget>,
        roots: &IndexSet<Utf8PathBuf>,
    ) -> Vec<Utf8PathBuf> {
        let mut dirs: IndexSet<Utf8PathBuf> = targets.map(GenerationTarget::output_dir).collect();
        dirs.extend(roots.iter().cloned());
        dirs.into_iter().collect()
    }

    fn materialize_one(
        &self,
        work: &Work<'_>,
        cancel: &CancellationToken,
    ) -> Result<MaterializedOutput, TargetError> {
        let target = work.target;
        let strategy = work.plan.strategy();
        let result = if cancel.is_cancelled() {
            Err(TargetError::Cancelled {
                target: target.name.clone(),
            })
        } else {
            self.set_state(work.index, TargetState::InProgress);
            debug!(header = %target.name, %strategy, "materializing");
            self.produce(work, cancel)
        };

        match result {
            Ok(persisted) => {
                self.set_state(work.index, TargetState::Materialized);
                info!(header = %target.name, output = %persisted.output, %strategy, "materialized");
                Ok(MaterializedOutput {
                    name: target.name.clone(),
                    strategy,
                    output: persisted.output,
                    digest: persisted.digest,
                    outcome: persisted.outcome,
                })
            }
            Err(err) => {
                discard_stale_output(target);
                self.set_state(work.index, TargetState::Failed);
                warn!(header = %target.name, error = %err, "materialization failed");
                Err(err)
            }
        }
    }

    fn produce(
        &self,
        work: &Work<'_>,
        cancel: &CancellationToken,
    ) -> Result<PersistedArtifact, TargetError> {
        let target = work.target;
        match work.plan {
            Plan::Generate { script, xml } => {
                let request = GeneratorRequest {
                    script,
                    flags: &target.flags,
                    xml,
                    version: &target.version,
                };
                self.invoker
                    .invoke(&request, &target.output, cancel)
                    .map_err(|err| TargetError::from_generation(&target.name, err))
                    .and_then(|artifact| {
                        artifact
                            .persist()
                            .map_err(|err| TargetError::from_io(&target.name, err))
                    })
            }
            Plan::CopyFallback { source } => FallbackCopier::copy(source, &target.output)
                .map_err(|err| TargetError::from_io(&target.name, err)),
        }
    }

    fn lock_states(&self) -> MutexGuard<'_, Vec<TargetState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset_states(&mut self) {
        self.states
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .fill(TargetState::Pending);
    }

    fn set_state(&self, index: usize, state: TargetState) {
        if let Some(slot) = self.lock_states().get_mut(index) {
            *slot = state;
        }
    }
}

/// Remove a failed target's output left over from an earlier build.
fn discard_stale_output(target: &GenerationTarget) {
    match fs::remove_file(&target.output) {
        Ok(()) => info!(header = %target.name, output = %target.output, "removed stale header"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            header = %target.name,
            output = %target.output,
            error = %err,
            "could not remove stale header"
        ),
    }
}

fn check_unique_outputs(targets: &[GenerationTarget]) -> Result<(), NodeError> {
    let mut owners: IndexMap<&Utf8PathBuf, &str> = IndexMap::new();
    for target in targets {
        if let Some(first) = owners.insert(&target.output, &target.name) {
            return Err(NodeError::DuplicateOutput {
                output: target.output.clone(),
                first: first.to_owned(),
                second: target.name.clone(),
            });
        }
    }
    Ok(())
}

fn default_jobs() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
