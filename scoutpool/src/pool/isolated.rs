//! Process-backed substrate.
//!
//! Each unit spawns a worker process, writes one [`WorkerRequest`] as JSON to
//! its stdin, closes stdin, and reads one [`TaskOutcome`] as JSON from its
//! stdout. The worker's stderr is inherited so its log lines reach the
//! parent's log sink.
//!
//! The worker side is [`serve`]; the `scoutpool worker` subcommand wires it
//! to stdin and stdout.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use tracing::{debug, trace};

use super::substrate::{Substrate, SubstrateKind};
use crate::errors::{SearchError, SearchResult};
use crate::reader::ReadOptions;
use crate::search::{FileProcessor, PatternMatcher, SearchTask, TaskOutcome};

/// What crosses into the worker process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub task: SearchTask,
    pub options: ReadOptions,
}

/// Spawns one worker process per unit
#[derive(Debug, Clone)]
pub struct IsolatedSubstrate {
    program: PathBuf,
    args: Vec<OsString>,
    options: ReadOptions,
}

impl IsolatedSubstrate {
    /// Uses `program worker` as the worker command
    pub fn new(program: impl Into<PathBuf>, options: ReadOptions) -> Self {
        Self {
            program: program.into(),
            args: vec![OsString::from("worker")],
            options,
        }
    }

    /// Uses the running executable as the worker
    pub fn current_exe(options: ReadOptions) -> SearchResult<Self> {
        Ok(Self::new(std::env::current_exe()?, options))
    }

    /// Replaces the worker arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one worker argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn(&self, path: &Path) -> SearchResult<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                SearchError::worker_fault(
                    path,
                    format!("failed to spawn {}: {}", self.program.display(), e),
                )
            })
    }

    fn send_request(child: &mut Child, request: &WorkerRequest) -> SearchResult<()> {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SearchError::worker_fault(request.task.path(), "worker stdin unavailable"))?;
        serde_json::to_writer(&mut stdin, request)?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        // Dropping stdin signals end of request
        Ok(())
    }
}

impl Substrate for IsolatedSubstrate {
    fn name(&self) -> &str {
        SubstrateKind::Isolated.as_str()
    }

    fn execute(&self, task: &SearchTask) -> SearchResult<TaskOutcome> {
        let path = task.path();
        let request = WorkerRequest {
            task: task.clone(),
            options: self.options.clone(),
        };

        let mut child = self.spawn(path)?;
        trace!("Spawned worker {} for {}", child.id(), path.display());

        if let Err(e) = Self::send_request(&mut child, &request) {
            // Reap the child before reporting
            let _ = child.kill();
            let _ = child.wait();
            return Err(SearchError::worker_fault(
                path,
                format!("failed to send request: {}", e),
            ));
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SearchError::worker_fault(path, format!("failed to wait: {}", e)))?;
        if !output.status.success() {
            return Err(SearchError::worker_fault(
                path,
                format!("worker exited with {}", output.status),
            ));
        }

        let outcome: TaskOutcome = serde_json::from_slice(&output.stdout)
            .map_err(|e| SearchError::worker_fault(path, format!("undecodable reply: {}", e)))?;
        if outcome.path() != path {
            return Err(SearchError::worker_fault(
                path,
                format!("reply was for {}", outcome.path().display()),
            ));
        }
        debug!("Worker finished {}", path.display());
        Ok(outcome)
    }
}

/// Worker-side entry point: read one request, run it, write one outcome.
///
/// Builds its own shift table, then runs the same [`FileProcessor`] the
/// lightweight substrate uses.
pub fn serve<R: Read, W: Write>(reader: R, mut writer: W) -> SearchResult<()> {
    let request: WorkerRequest = serde_json::from_reader(reader)?;
    let matcher = PatternMatcher::new(request.task.pattern())?;
    let processor = FileProcessor::new(Arc::new(matcher), request.options);
    let outcome = processor.process(&request.task);
    serde_json::to_writer(&mut writer, &outcome)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
