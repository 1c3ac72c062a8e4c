//! OpenVPN process supervision
//!
//! [`ProcessSupervisor`] owns the single-instance slot for the supervised
//! daemon. Starting a second daemon while one is active fails fast with
//! [`VpnError::AlreadyRunning`]. Every started daemon gets an exit watcher
//! task that owns the child handle, frees the slot on exit and delivers
//! exactly one exit event.

use crate::error::VpnError;
use crate::vpn::stream_drain::{SharedTrailingBuffer, StreamDrain};
use crate::vpn::{OutputLine, StreamSource};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long the exit watcher waits for the drains to reach end-of-stream
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Executable and argument vector for one daemon run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl DaemonCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Display name of the daemon, the executable's final path component
    pub fn name(&self) -> String {
        display_name(&self.program)
    }
}

/// Final non-empty path component, splitting on both `/` and `\`
pub fn display_name(program: &Path) -> String {
    let program = program.to_string_lossy();
    program
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(&*program)
        .to_string()
}

/// Result delivered once per daemon when it exits
///
/// `Ok` carries the last retained output line after a clean exit.
pub type ExitEvent = Result<Option<String>, VpnError>;

/// How the exit watcher should stop the child
#[derive(Debug, Clone, Copy)]
enum StopMode {
    Kill,
    Graceful(Duration),
}

struct StopRequest {
    mode: StopMode,
    done: Option<oneshot::Sender<()>>,
}

/// Occupant of the single-instance slot
struct ActiveProcess {
    generation: u64,
    name: String,
    pid: Option<u32>,
    stop_sender: oneshot::Sender<StopRequest>,
}

/// Handle to a started daemon
///
/// Output lines arrive on `lines`; the exit event arrives on `exit`.
pub struct SupervisedProcess {
    pub name: String,
    pub pid: Option<u32>,
    pub lines: mpsc::UnboundedReceiver<OutputLine>,
    pub exit: oneshot::Receiver<ExitEvent>,
}

/// Owner of at most one supervised daemon
///
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct ProcessSupervisor {
    slot: Arc<Mutex<Option<ActiveProcess>>>,
    generations: Arc<AtomicU64>,
}

static SHARED_SUPERVISOR: OnceLock<ProcessSupervisor> = OnceLock::new();

impl ProcessSupervisor {
    /// Supervisor with a slot of its own
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide supervisor
    pub fn shared() -> Self {
        SHARED_SUPERVISOR.get_or_init(Self::new).clone()
    }

    fn slot(&self) -> MutexGuard<'_, Option<ActiveProcess>> {
        // The slot holds plain data, so a poisoned lock is still consistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a daemon currently occupies the slot
    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    /// PID of the active daemon, if any
    pub fn pid(&self) -> Option<u32> {
        self.slot().as_ref().and_then(|active| active.pid)
    }

    /// Spawn the daemon and start supervising it
    ///
    /// Fails with `AlreadyRunning` without spawning anything when the slot
    /// is occupied.
    pub fn start(
        &self,
        command: &DaemonCommand,
        verbose: bool,
    ) -> Result<SupervisedProcess, VpnError> {
        let name = command.name();
        let mut slot = self.slot();

        if let Some(active) = slot.as_ref() {
            warn!("{} is already running (PID {:?})", active.name, active.pid);
            return Err(VpnError::AlreadyRunning {
                name: active.name.clone(),
            });
        }

        info!("{} daemon starting...", name);
        debug!("Spawning {:?} with args {:?}", command.program, command.args);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VpnError::ProcessSpawnError {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        let pid = child.id();
        debug!("{} daemon spawned with PID {:?}", name, pid);

        let (line_sender, lines) = mpsc::unbounded_channel();
        let drain = StreamDrain::new(name.as_str(), verbose, line_sender);
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(drain.spawn(StreamSource::Stdout, stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(drain.spawn(StreamSource::Stderr, stderr));
        }
        let trailing = drain.trailing();
        drop(drain);

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (stop_sender, stop_receiver) = oneshot::channel();
        let (exit_sender, exit) = oneshot::channel();

        *slot = Some(ActiveProcess {
            generation,
            name: name.clone(),
            pid,
            stop_sender,
        });
        drop(slot);

        let watcher = ExitWatcher {
            slot: Arc::clone(&self.slot),
            generation,
            name: name.clone(),
            trailing,
            drains,
        };
        tokio::spawn(watcher.run(child, stop_receiver, exit_sender));

        Ok(SupervisedProcess {
            name,
            pid,
            lines,
            exit,
        })
    }

    /// Kill the active daemon and free the slot
    ///
    /// A no-op when nothing is running.
    pub fn terminate(&self) {
        if let Some(active) = self.slot().take() {
            info!("Killing {} daemon (PID {:?})", active.name, active.pid);
            let _ = active.stop_sender.send(StopRequest {
                mode: StopMode::Kill,
                done: None,
            });
        }
    }

    /// Ask the active daemon to exit, killing it after `grace`
    ///
    /// Returns once the daemon is gone. A no-op when nothing is running.
    pub async fn shutdown(&self, grace: Duration) {
        let active = self.slot().take();
        let Some(active) = active else {
            return;
        };

        info!("Stopping {} daemon (PID {:?})", active.name, active.pid);
        let (done_sender, done) = oneshot::channel();
        let request = StopRequest {
            mode: StopMode::Graceful(grace),
            done: Some(done_sender),
        };

        if active.stop_sender.send(request).is_ok() {
            let _ = done.await;
        }
    }
}

/// Background task owning the child handle
struct ExitWatcher {
    slot: Arc<Mutex<Option<ActiveProcess>>>,
    generation: u64,
    name: String,
    trailing: SharedTrailingBuffer,
    drains: Vec<JoinHandle<()>>,
}

impl ExitWatcher {
    async fn run(
        mut self,
        mut child: Child,
        mut stop_receiver: oneshot::Receiver<StopRequest>,
        exit_sender: oneshot::Sender<ExitEvent>,
    ) {
        let mut done = None;
        let mut stop_requested = false;
        let status = tokio::select! {
            status = child.wait() => status,
            request = &mut stop_receiver => match request {
                Ok(request) => {
                    stop_requested = true;
                    done = request.done;
                    stop_child(&mut child, request.mode, &self.name).await
                }
                Err(_) => child.wait().await,
            },
        };

        self.finish_drains().await;
        self.release_slot();

        // A pending attempt reports the exit itself. The receiver is gone
        // once the connection was established or given up.
        match exit_sender.send(self.exit_event(status)) {
            Ok(()) => debug!("{} daemon exit delivered", self.name),
            Err(Ok(_)) => info!("{} daemon exited with code 0", self.name),
            Err(Err(e)) if stop_requested => info!("{}", e),
            Err(Err(e)) => warn!("{}", e),
        }
        if let Some(done) = done {
            let _ = done.send(());
        }
    }

    async fn finish_drains(&mut self) {
        let joined = tokio::time::timeout(DRAIN_GRACE, async {
            for drain in self.drains.iter_mut() {
                let _ = drain.await;
            }
        })
        .await;

        if joined.is_err() {
            debug!("{} output still open after exit, abandoning drains", self.name);
            for drain in &self.drains {
                drain.abort();
            }
        }
    }

    fn release_slot(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot
            .as_ref()
            .is_some_and(|active| active.generation == self.generation)
        {
            *slot = None;
        }
    }

    fn exit_event(&self, status: std::io::Result<ExitStatus>) -> ExitEvent {
        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                warn!("Failed to wait for {} daemon: {}", self.name, e);
                None
            }
        };

        match code {
            Some(0) => {
                let last = self
                    .trailing
                    .lock()
                    .ok()
                    .and_then(|trailing| trailing.last().map(str::to_string));
                Ok(last)
            }
            Some(code) => Err(VpnError::ProcessExit {
                code: Some(code),
                message: format!("{} daemon exited with code {}", self.name, code),
            }),
            None => Err(VpnError::ProcessExit {
                code: None,
                message: format!("{} daemon was terminated by a signal", self.name),
            }),
        }
    }
}

async fn stop_child(child: &mut Child, mode: StopMode, name: &str) -> std::io::Result<ExitStatus> {
    match mode {
        StopMode::Kill => {
            if let Err(e) = child.start_kill() {
                debug!("Kill of {} daemon failed: {}", name, e);
            }
            child.wait().await
        }
        StopMode::Graceful(grace) => {
            request_exit(child, name);
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!("{} daemon ignored shutdown request, killing it", name);
                    if let Err(e) = child.start_kill() {
                        debug!("Kill of {} daemon failed: {}", name, e);
                    }
                    child.wait().await
                }
            }
        }
    }
}

#[cfg(unix)]
fn request_exit(child: &mut Child, name: &str) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            debug!("Failed to send SIGTERM to {} daemon: {}", name, e);
        }
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child, name: &str) {
    if let Err(e) = child.start_kill() {
        debug!("Kill of {} daemon failed: {}", name, e);
    }
}
