pub mod description;
pub mod gate;
pub mod metadata;
pub mod model;
pub mod sink;
pub mod suite;
pub mod xml;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::config::ReporterConfig;
use crate::{Error, Result};
use description::DescriptionParser;
use gate::CompletionGate;
use metadata::{EnvSource, Metadata, ProcessEnv};
use model::{Context, ContextResult, Outcome};
use sink::{FsSink, ReportSink};
use suite::{SuiteAccumulator, SuiteRecord};

/// Formats one failure log line before it is written to the report.
pub type FormatError = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Source of the current time (suite timestamps, timestamped output names).
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Where the reporter is in the host runner's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No run has started yet.
    Idle,
    /// Between run start and run complete.
    Active,
    /// The last run's report has been handed off for writing.
    Rendered,
}

/// Aggregation state for one run. Replaced on every run start, dropped once the report is dispatched.
#[derive(Debug, Default)]
struct RunState {
    suites: SuiteAccumulator,
    messages: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Artifact {
    Report,
    Metadata,
}

/// Turns host runner lifecycle callbacks into a JUnit XML report and a metadata file.
///
/// Callbacks are expected on one logical thread. Writes are spawned onto the
/// current Tokio runtime and tracked by a [`CompletionGate`] so `on_exit`
/// only signals once every artifact is on disk.
pub struct JunitXrayReporter {
    config: ReporterConfig,
    parser: DescriptionParser,
    output_path: PathBuf,
    metadata_path: PathBuf,
    hostname: String,
    sink: Arc<dyn ReportSink>,
    env: Arc<dyn EnvSource>,
    format_error: FormatError,
    clock: Clock,
    gate: CompletionGate,
    /// First metadata write failure, reported through `on_exit`.
    fatal: Arc<Mutex<Option<Error>>>,
    phase: RunPhase,
    state: Option<RunState>,
}

impl JunitXrayReporter {
    pub fn new(config: ReporterConfig) -> Self {
        let clock: Clock = Box::new(Utc::now);
        let output_path = config.output_path(clock());
        let metadata_path = config.metadata_path();
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|e| {
                tracing::warn!("Cannot resolve hostname, using 'localhost': {}", e);
                "localhost".to_string()
            });

        Self {
            parser: DescriptionParser::new(config.tagging_marker.clone(), config.xray_id_only),
            config,
            output_path,
            metadata_path,
            hostname,
            sink: Arc::new(FsSink),
            env: Arc::new(ProcessEnv),
            format_error: Box::new(|line| line.to_string()),
            clock,
            gate: CompletionGate::new(),
            fatal: Arc::new(Mutex::new(None)),
            phase: RunPhase::Idle,
            state: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_format_error(mut self, format_error: FormatError) -> Self {
        self.format_error = format_error;
        self
    }

    /// Replace the clock. Recomputes a timestamped output path.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.output_path = self.config.output_path(clock());
        self.clock = clock;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn pending_writes(&self) -> usize {
        self.gate.pending()
    }

    /// Suites of the active run, `None` outside a run.
    pub fn suites(&self) -> Option<&[SuiteRecord]> {
        self.state.as_ref().map(|s| s.suites.suites())
    }

    pub fn buffered_messages(&self) -> &[String] {
        self.state.as_ref().map(|s| s.messages.as_slice()).unwrap_or(&[])
    }

    /// Start a run, discarding whatever an unfinished previous run collected.
    pub fn on_run_start(&mut self, contexts: &[Context]) {
        if self.phase == RunPhase::Active {
            tracing::debug!("Run restarted before completing, discarding previous results");
        }
        self.state = Some(RunState::default());
        self.phase = RunPhase::Active;
        tracing::debug!("Run started with {} context(s)", contexts.len());

        let project_key = self.config.effective_project_key(self.env.as_ref());
        let metadata = Metadata::capture(project_key, &self.config.env_properties, self.env.as_ref());
        match metadata.to_json() {
            Ok(bytes) => self.dispatch(Artifact::Metadata, self.metadata_path.clone(), bytes),
            Err(e) => {
                tracing::error!("Cannot serialize metadata: {}", e);
                keep_first(&self.fatal, e);
            }
        }
    }

    pub fn on_context_start(&mut self, context: &Context) {
        let Some(state) = self.state.as_mut() else {
            tracing::debug!("Context '{}' started outside a run, ignoring", context.id);
            return;
        };
        let timestamp = (self.clock)().format("%Y-%m-%dT%H:%M:%S").to_string();
        let record = SuiteRecord::new(
            context.name.clone(),
            self.config.suite.clone(),
            timestamp,
            self.hostname.clone(),
        );
        state.suites.start(context, record);
    }

    pub fn on_outcome(&mut self, context: &Context, outcome: &Outcome) {
        let Some(state) = self.state.as_mut() else {
            tracing::debug!("Outcome for '{}' outside a run, ignoring", context.id);
            return;
        };
        state.suites.record(context, outcome, &self.parser, &*self.format_error);
    }

    pub fn on_context_complete(&mut self, context: &Context, result: &ContextResult) {
        let completed = self
            .state
            .as_mut()
            .map(|state| state.suites.complete(context, result))
            .unwrap_or(false);
        if !completed {
            // The host reports completion for contexts that failed while starting.
            tracing::debug!("Context '{}' completed without starting, ignoring", context.id);
        }
    }

    /// Buffer a console message from a context. Cleared when the run completes.
    pub fn on_browser_log(&mut self, context: &Context, message: &str) {
        if let Some(state) = self.state.as_mut() {
            state.messages.push(format!("{}: {}", context.name, message));
        }
    }

    /// Render the report, hand it off for writing and drop the run state.
    pub fn on_run_complete(&mut self) {
        let Some(state) = self.state.take() else {
            tracing::debug!("Run completed with no active run, nothing to write");
            return;
        };
        self.phase = RunPhase::Rendered;

        match xml::render(state.suites.suites()) {
            Ok(bytes) => self.dispatch(Artifact::Report, self.output_path.clone(), bytes),
            Err(e) => tracing::warn!("Cannot render JUnit xml\n\t{}", e),
        }
    }

    /// Call `done` once every dispatched write has finished.
    ///
    /// `done` receives the metadata write failure, if one happened.
    pub fn on_exit(&self, done: impl FnOnce(Result<()>) + Send + 'static) {
        let fatal = Arc::clone(&self.fatal);
        self.gate.await_quiescence(move || {
            let failure = fatal.lock().unwrap().take();
            match failure {
                Some(e) => done(Err(e)),
                None => done(Ok(())),
            }
        });
    }

    /// Async form of [`on_exit`](Self::on_exit).
    pub async fn finish(&self) -> Result<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.on_exit(move |result| {
            let _ = tx.send(result);
        });
        rx.await.unwrap_or(Ok(()))
    }

    fn dispatch(&self, artifact: Artifact, path: PathBuf, contents: Vec<u8>) {
        let pending = self.gate.enter();
        let write = self.sink.write(&path, contents);
        let fatal = Arc::clone(&self.fatal);

        let task = async move {
            match (write.await, artifact) {
                (Ok(()), Artifact::Report) => {
                    tracing::debug!("JUnit results written to \"{}\".", path.display());
                }
                (Ok(()), Artifact::Metadata) => {
                    tracing::debug!("Metadata written to \"{}\".", path.display());
                }
                (Err(source), Artifact::Report) => {
                    tracing::warn!("{}", Error::ReportWrite { path, source });
                }
                (Err(source), Artifact::Metadata) => {
                    let error = Error::MetadataWrite { path, source };
                    tracing::error!("{}", error);
                    keep_first(&fatal, error);
                }
            }
            drop(pending);
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(task),
                Err(e) => tracing::error!("No runtime available for writing: {}", e),
            },
        }
    }
}

fn keep_first(slot: &Mutex<Option<Error>>, error: Error) {
    let mut slot = slot.lock().unwrap();
    if slot.is_none() {
        *slot = Some(error);
    }
}
