//! # Command Queue
//!
//! Every external git invocation goes through a `CommandQueue`, which caps the
//! number of processes running at once across the whole program. Callers from
//! any thread submit work and block on a private reply channel; they never
//! manage the ceiling themselves.
//!
//! ## Design
//!
//! A single dispatcher thread owns two sequences: the in-flight set (never
//! larger than the limit) and an unbounded FIFO backlog. Submissions and
//! completions travel on two separate unbounded channels, and every send is
//! followed by a ring on a shared wake channel. On each wake the dispatcher:
//!
//! - drains **completions** first: removes each finished request from the
//!   in-flight set and delivers its output on the request's reply channel;
//! - then drains **submissions** onto the end of the backlog;
//! - then starts backlog requests while capacity allows.
//!
//! Neither the submitting callers nor the worker threads ever block when
//! signalling the dispatcher, and a burst of submissions is never processed
//! ahead of a completion that was already signalled. A command that fails (or cannot even be
//! started) produces a failed `CommandOutput`; it never stops the dispatcher.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use log::{debug, trace};

use crate::error::{Error, Result};

/// Maximum number of external processes running at once.
pub const MAX_SIMULTANEOUS_COMMANDS: usize = 32;

/// An external command and the directory to run it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

impl CommandSpec {
    /// A `git` command run in `dir`.
    pub fn git<I, S>(dir: &Path, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: "git".to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dir: dir.to_path_buf(),
        }
    }

    /// Runs the command to completion, capturing its output.
    fn run(&self) -> CommandOutput {
        match Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .output()
        {
            Ok(output) => CommandOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => CommandOutput::failed(format!("{}: {}", self, e)),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, if the process ran and exited normally.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            code: None,
            stdout: String::new(),
            stderr: message,
        }
    }

    /// Trimmed standard output.
    pub fn text(&self) -> &str {
        self.stdout.trim()
    }

    /// Trimmed standard output followed by standard error.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{}\n{}", stdout, stderr),
            (false, true) => stdout.to_string(),
            _ => stderr.to_string(),
        }
    }
}

type Job = Box<dyn FnOnce() -> CommandOutput + Send + 'static>;

struct Request {
    id: u64,
    label: String,
    job: Job,
    reply: Sender<CommandOutput>,
}

struct Done {
    id: u64,
    output: CommandOutput,
}

/// Doorbell rung after anything is sent to the dispatcher.
enum Wake {
    Signal,
    Shutdown,
}

struct InFlight {
    id: u64,
    reply: Sender<CommandOutput>,
}

struct Dispatcher {
    limit: usize,
    in_flight: Vec<InFlight>,
    backlog: VecDeque<Request>,
    completions: Sender<Done>,
    wake: Sender<Wake>,
}

impl Dispatcher {
    fn run(
        mut self,
        submissions: Receiver<Request>,
        completions: Receiver<Done>,
        wake: Receiver<Wake>,
    ) {
        let mut shutting_down = false;
        while let Ok(signal) = wake.recv() {
            if let Wake::Shutdown = signal {
                shutting_down = true;
            }
            // Completions are drained before submissions.
            while let Ok(done) = completions.try_recv() {
                self.finish(done);
            }
            while let Ok(request) = submissions.try_recv() {
                if self.in_flight.len() >= self.limit {
                    trace!("queueing {} behind {} others", request.label, self.backlog.len());
                }
                self.backlog.push_back(request);
            }
            while self.in_flight.len() < self.limit {
                match self.backlog.pop_front() {
                    Some(next) => self.start(next),
                    None => break,
                }
            }
            if shutting_down && self.in_flight.is_empty() && self.backlog.is_empty() {
                break;
            }
        }
    }

    fn finish(&mut self, done: Done) {
        if let Some(pos) = self.in_flight.iter().position(|f| f.id == done.id) {
            let finished = self.in_flight.swap_remove(pos);
            // The caller may have stopped waiting.
            let _ = finished.reply.send(done.output);
        }
    }

    fn start(&mut self, request: Request) {
        let Request {
            id,
            label,
            job,
            reply,
        } = request;
        debug!("running {}", label);
        let completions = self.completions.clone();
        let wake = self.wake.clone();
        let spawned = thread::Builder::new()
            .name(format!("cmd-{}", id))
            .spawn(move || {
                let output = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|_| {
                    CommandOutput::failed(format!("{} panicked", label))
                });
                let _ = completions.send(Done { id, output });
                let _ = wake.send(Wake::Signal);
            });
        match spawned {
            Ok(_) => self.in_flight.push(InFlight { id, reply }),
            Err(e) => {
                let _ = reply.send(CommandOutput::failed(format!(
                    "unable to start worker: {}",
                    e
                )));
            }
        }
    }
}

struct Shared {
    submissions: Sender<Request>,
    wake: Sender<Wake>,
    next_id: std::sync::atomic::AtomicU64,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let _ = self.wake.send(Wake::Shutdown);
    }
}

/// Bounded-concurrency executor for external commands.
///
/// Cloning is cheap; every clone feeds the same dispatcher. The dispatcher
/// exits once the last clone is dropped and all queued work has finished.
#[derive(Clone)]
pub struct CommandQueue {
    shared: Arc<Shared>,
}

impl CommandQueue {
    /// Starts a queue allowing `MAX_SIMULTANEOUS_COMMANDS` concurrent commands.
    pub fn new() -> Result<Self> {
        Self::with_limit(MAX_SIMULTANEOUS_COMMANDS)
    }

    /// Starts a queue allowing at most `limit` concurrent commands.
    ///
    /// Fails if the dispatcher thread cannot be spawned.
    pub fn with_limit(limit: usize) -> Result<Self> {
        let (submit_tx, submit_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let (wake_tx, wake_rx) = mpsc::channel();
        let dispatcher = Dispatcher {
            limit: limit.max(1),
            in_flight: Vec::new(),
            backlog: VecDeque::new(),
            completions: done_tx,
            wake: wake_tx.clone(),
        };
        thread::Builder::new()
            .name("cmd-dispatcher".to_string())
            .spawn(move || dispatcher.run(submit_rx, done_rx, wake_rx))
            .map_err(|e| Error::Executor {
                message: format!("unable to start dispatcher: {}", e),
            })?;
        Ok(Self {
            shared: Arc::new(Shared {
                submissions: submit_tx,
                wake: wake_tx,
                next_id: std::sync::atomic::AtomicU64::new(0),
            }),
        })
    }

    /// Queues a command; its output arrives exactly once on the returned
    /// receiver.
    pub fn submit(&self, spec: CommandSpec) -> Result<Receiver<CommandOutput>> {
        let label = spec.to_string();
        self.submit_job(label, Box::new(move || spec.run()))
    }

    /// Queues a command and blocks until it has run.
    pub fn run(&self, spec: CommandSpec) -> Result<CommandOutput> {
        let label = spec.to_string();
        let receiver = self.submit(spec)?;
        receiver.recv().map_err(|_| Error::Executor {
            message: format!("no reply for {}", label),
        })
    }

    /// Queues a command and returns its trimmed stdout, or an error holding
    /// its combined output when it fails.
    pub fn output(&self, spec: CommandSpec) -> Result<String> {
        let command = spec.to_string();
        let dir = spec.dir.clone();
        let output = self.run(spec)?;
        if output.success {
            Ok(output.text().to_string())
        } else {
            Err(Error::GitCommand {
                command,
                dir,
                output: output.combined(),
            })
        }
    }

    pub(crate) fn submit_job(&self, label: String, job: Job) -> Result<Receiver<CommandOutput>> {
        let (reply, receiver) = mpsc::channel();
        let id = self
            .shared
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        fn stopped<T>(_: mpsc::SendError<T>) -> Error {
            Error::Executor {
                message: "dispatcher has stopped".to_string(),
            }
        }
        self.shared
            .submissions
            .send(Request {
                id,
                label,
                job,
                reply,
            })
            .map_err(stopped)?;
        self.shared.wake.send(Wake::Signal).map_err(stopped)?;
        Ok(receiver)
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue").finish_non_exhaustive()
    }
}
