//! Doubles for the SSH client runner and the channel transport, shared by
//! unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use crate::channel::{ChannelError, ClientOutput, ClientRunner, Session, Transport};
use crate::command::RemoteCommand;

/// Client runner double that replays queued outcomes in order and records
/// every call it receives.
///
/// Not thread-safe; use it only from the test's own thread.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    queue: Rc<RefCell<VecDeque<ClientOutput>>>,
    calls: Rc<RefCell<Vec<ClientCall>>>,
}

/// One call observed by [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientCall {
    /// Program the transport asked to spawn.
    pub program: String,
    /// Arguments in the order given.
    pub args: Vec<OsString>,
}

impl ClientCall {
    /// Renders the call as space-separated words, without quoting.
    #[must_use]
    pub fn command_string(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a runner with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<ClientCall> {
        self.calls.borrow().clone()
    }

    /// Queues a clean exit.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Queues exit status `code` with a generic stderr message.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Queues an arbitrary outcome.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.queue.borrow_mut().push_back(ClientOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl ClientRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<ClientOutput, ChannelError> {
        self.calls.borrow_mut().push(ClientCall {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        let next = self.queue.borrow_mut().pop_front();
        next.ok_or_else(|| ChannelError::Spawn {
            program: program.to_owned(),
            message: String::from("scripted runner queue is empty"),
        })
    }
}

/// Event observed by [`RecordingTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChannelEvent {
    /// A session was opened.
    Connect,
    /// A command started; carries the executed shell line.
    ExecuteStart(String),
    /// The command with this shell line finished.
    ExecuteEnd(String),
    /// A file was uploaded.
    Upload {
        /// Local source path.
        local: Utf8PathBuf,
        /// Remote destination path.
        remote: Utf8PathBuf,
        /// Contents of the local file at upload time.
        contents: String,
    },
    /// A session was dropped.
    Disconnect,
}

#[derive(Debug, Default)]
struct RecordingState {
    events: Vec<ChannelEvent>,
    fail_connect: bool,
    fail_uploads: bool,
    failing_fragments: Vec<String>,
    outputs: VecDeque<String>,
    attempted_uploads: Vec<Utf8PathBuf>,
}

/// Thread-safe transport double that records every interaction.
///
/// Commands succeed with empty output unless a queued output or a failure
/// rule applies. An optional delay is applied inside each command so
/// overlapping callers would be observable through
/// [`RecordingTransport::max_in_flight`].
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<RecordingState>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Duration,
}

impl RecordingTransport {
    /// Creates a transport where every operation succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps for `delay` inside every command and upload.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every subsequent connection attempt fail.
    pub fn fail_connect(&self) {
        self.lock().fail_connect = true;
    }

    /// Makes every subsequent upload fail.
    pub fn fail_uploads(&self) {
        self.lock().fail_uploads = true;
    }

    /// Fails any command whose shell line contains `fragment`.
    pub fn fail_commands_containing(&self, fragment: &str) {
        self.lock().failing_fragments.push(fragment.to_owned());
    }

    /// Queues stdout returned by the next successful command.
    pub fn push_output(&self, stdout: &str) {
        self.lock().outputs.push_back(stdout.to_owned());
    }

    /// Returns a snapshot of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ChannelEvent> {
        self.lock().events.clone()
    }

    /// Returns the shell lines of every command started so far.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                ChannelEvent::ExecuteStart(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns every recorded upload as `(local, remote, contents)`.
    #[must_use]
    pub fn uploads(&self) -> Vec<(Utf8PathBuf, Utf8PathBuf, String)> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                ChannelEvent::Upload {
                    local,
                    remote,
                    contents,
                } => Some((local.clone(), remote.clone(), contents.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns the local path of every upload attempted, including failed
    /// ones.
    #[must_use]
    pub fn attempted_uploads(&self) -> Vec<Utf8PathBuf> {
        self.lock().attempted_uploads.clone()
    }

    /// Returns the largest number of operations observed running at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Transport for RecordingTransport {
    type Session = RecordingSession;

    fn connect(&self) -> Result<Self::Session, ChannelError> {
        let mut state = self.lock();
        if state.fail_connect {
            return Err(ChannelError::Connect {
                host: String::from("recording"),
                message: String::from("simulated connection failure"),
            });
        }
        state.events.push(ChannelEvent::Connect);
        Ok(RecordingSession {
            transport: self.clone(),
        })
    }
}

/// Session produced by [`RecordingTransport`].
#[derive(Debug)]
pub struct RecordingSession {
    transport: RecordingTransport,
}

impl Session for RecordingSession {
    fn execute(&mut self, command: &RemoteCommand) -> Result<String, ChannelError> {
        let line = command.as_shell().to_owned();
        self.transport
            .lock()
            .events
            .push(ChannelEvent::ExecuteStart(line.clone()));
        self.transport.enter();
        self.transport.leave();

        let mut state = self.transport.lock();
        state.events.push(ChannelEvent::ExecuteEnd(line.clone()));
        if state
            .failing_fragments
            .iter()
            .any(|fragment| line.contains(fragment.as_str()))
        {
            return Err(ChannelError::Execution {
                command: command.to_string(),
                status: Some(1),
                status_text: String::from("1"),
                stderr: String::from("simulated failure"),
            });
        }
        Ok(state.outputs.pop_front().unwrap_or_default())
    }

    fn upload(&mut self, local: &Utf8Path, remote: &Utf8Path) -> Result<(), ChannelError> {
        self.transport.enter();
        self.transport.leave();

        let mut state = self.transport.lock();
        state.attempted_uploads.push(local.to_path_buf());
        if state.fail_uploads {
            return Err(ChannelError::Transfer {
                local: local.to_path_buf(),
                remote: remote.to_path_buf(),
                message: String::from("simulated transfer failure"),
            });
        }
        let bytes = std::fs::read(local).map_err(|err| ChannelError::Transfer {
            local: local.to_path_buf(),
            remote: remote.to_path_buf(),
            message: err.to_string(),
        })?;
        let contents = String::from_utf8_lossy(&bytes).into_owned();
        state.events.push(ChannelEvent::Upload {
            local: local.to_path_buf(),
            remote: remote.to_path_buf(),
            contents,
        });
        Ok(())
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.transport.lock().events.push(ChannelEvent::Disconnect);
    }
}
