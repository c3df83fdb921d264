//! Daemon process supervision
//!
//! Owns at most one running instance each of the node and wallet daemons.
//! Child stdout/stderr are forwarded line-by-line into the log aggregator by
//! background reader tasks; a poller task (node only) refreshes the telemetry
//! cell every few seconds until it is told to stop.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::core::{LogAggregator, TelemetrySnapshot};
use crate::error::{ConsoleError, ConsoleResult};
use crate::services::locate::locate_executable;
use crate::traits::RpcGateway;

/// Default node RPC port.
pub const NODE_RPC_PORT: u16 = 18081;
/// Default wallet RPC port.
pub const WALLET_RPC_PORT: u16 = 18082;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The two supervised daemon kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    Node,
    Wallet,
}

impl ProcessKind {
    /// Binary name, resolved against the build tree or the search path.
    pub fn binary(&self) -> &'static str {
        match self {
            ProcessKind::Node => "fuegod",
            ProcessKind::Wallet => "walletd",
        }
    }

    /// Log source tag for the stdout reader.
    pub fn tag(&self) -> &'static str {
        match self {
            ProcessKind::Node => "NODE",
            ProcessKind::Wallet => "WALLET",
        }
    }

    /// Log source tag for the stderr reader.
    pub fn err_tag(&self) -> &'static str {
        match self {
            ProcessKind::Node => "NODE-ERR",
            ProcessKind::Wallet => "WALLET-ERR",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ProcessKind::Node => "Node",
            ProcessKind::Wallet => "Wallet RPC",
        }
    }
}

/// How to launch one daemon kind. Tests override this to point at harmless
/// stand-in binaries.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub binary: PathBuf,
    pub args: Vec<String>,
}

/// Result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of a `stop` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Record for one launched daemon, owned exclusively by the supervisor.
struct SupervisedProcess {
    child: Child,
    /// Closes the telemetry poller loop; present for the node only.
    poller_shutdown: Option<watch::Sender<bool>>,
}

/// Supervisor for the node and wallet daemons.
pub struct ProcessSupervisor<G: RpcGateway + 'static> {
    gateway: Arc<G>,
    logs: LogAggregator,

    node: Mutex<Option<SupervisedProcess>>,
    wallet: Mutex<Option<SupervisedProcess>>,

    node_rpc_port: u16,
    wallet_rpc_port: u16,
    bin_dir: Option<PathBuf>,
    poll_interval: Duration,
    launch_overrides: HashMap<ProcessKind, LaunchSpec>,

    telemetry: watch::Sender<TelemetrySnapshot>,
}

impl<G: RpcGateway + 'static> ProcessSupervisor<G> {
    pub fn new(gateway: Arc<G>, logs: LogAggregator) -> Self {
        let (telemetry, _) = watch::channel(TelemetrySnapshot::default());
        Self {
            gateway,
            logs,
            node: Mutex::new(None),
            wallet: Mutex::new(None),
            node_rpc_port: NODE_RPC_PORT,
            wallet_rpc_port: WALLET_RPC_PORT,
            bin_dir: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            launch_overrides: HashMap::new(),
            telemetry,
        }
    }

    /// Configure the daemon RPC ports (fluent API)
    pub fn with_ports(mut self, node_rpc_port: u16, wallet_rpc_port: u16) -> Self {
        self.node_rpc_port = node_rpc_port;
        self.wallet_rpc_port = wallet_rpc_port;
        self
    }

    /// Configure an explicit binary directory (fluent API)
    pub fn with_bin_dir(mut self, bin_dir: Option<PathBuf>) -> Self {
        self.bin_dir = bin_dir;
        self
    }

    /// Configure the telemetry poll interval (fluent API)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override how a daemon kind is launched (fluent API)
    pub fn with_launch_spec(mut self, kind: ProcessKind, spec: LaunchSpec) -> Self {
        self.launch_overrides.insert(kind, spec);
        self
    }

    /// Subscribe to telemetry updates from the node poller.
    pub fn telemetry(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.telemetry.subscribe()
    }

    /// The most recently published telemetry snapshot.
    pub fn current_telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.borrow().clone()
    }

    fn slot(&self, kind: ProcessKind) -> &Mutex<Option<SupervisedProcess>> {
        match kind {
            ProcessKind::Node => &self.node,
            ProcessKind::Wallet => &self.wallet,
        }
    }

    fn launch_spec(&self, kind: ProcessKind) -> LaunchSpec {
        if let Some(spec) = self.launch_overrides.get(&kind) {
            return spec.clone();
        }
        let binary = locate_executable(kind.binary(), self.bin_dir.as_deref())
            .unwrap_or_else(|| PathBuf::from(kind.binary()));
        let args = match kind {
            ProcessKind::Node => vec![
                format!("--rpc-bind-port={}", self.node_rpc_port),
                format!(
                    "--data-dir={}",
                    std::env::temp_dir().join("fuego-node-data").display()
                ),
            ],
            ProcessKind::Wallet => vec![
                format!("--rpc-bind-port={}", self.wallet_rpc_port),
                format!("--daemon-port={}", self.node_rpc_port),
            ],
        };
        LaunchSpec { binary, args }
    }

    /// Launch a daemon if it is not already running.
    ///
    /// Wires stdout/stderr into the log aggregator and, for the node, starts
    /// the telemetry poller. A second `start` without an intervening `stop`
    /// is a no-op.
    pub async fn start(&self, kind: ProcessKind) -> ConsoleResult<StartOutcome> {
        let mut slot = self.slot(kind).lock().await;

        if let Some(process) = slot.as_mut() {
            if process_is_running(&mut process.child) {
                self.logs
                    .append("CONSOLE", &format!("{} already running", kind.describe()))
                    .await;
                return Ok(StartOutcome::AlreadyRunning);
            }
            // Exited behind our back; clear the stale record and relaunch.
            *slot = None;
        }

        let spec = self.launch_spec(kind);
        let mut cmd = Command::new(&spec.binary);
        cmd.args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = ConsoleError::launch(spec.binary.display().to_string(), &e);
                warn!(binary = %spec.binary.display(), "launch failed: {e}");
                self.logs
                    .append(
                        "CONSOLE",
                        &format!("Failed to start {}: {e}", kind.describe()),
                    )
                    .await;
                return Err(err);
            }
        };

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_stream(stdout, kind.tag(), self.logs.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stream(stderr, kind.err_tag(), self.logs.clone()));
        }

        let mut record = SupervisedProcess {
            child,
            poller_shutdown: None,
        };

        if kind == ProcessKind::Node {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            record.poller_shutdown = Some(shutdown_tx);
            tokio::spawn(poll_node_telemetry(
                Arc::clone(&self.gateway),
                self.telemetry.clone(),
                self.node_rpc_port,
                self.poll_interval,
                shutdown_rx,
            ));
        }

        *slot = Some(record);
        info!(binary = %spec.binary.display(), "started {}", kind.describe());
        self.logs
            .append("CONSOLE", &format!("Started {}", spec.binary.display()))
            .await;
        Ok(StartOutcome::Started)
    }

    /// Hard-kill a daemon and clear its record. No graceful-shutdown wait.
    pub async fn stop(&self, kind: ProcessKind) -> StopOutcome {
        let mut slot = self.slot(kind).lock().await;
        match slot.take() {
            None => {
                self.logs
                    .append("CONSOLE", &format!("{} not running", kind.describe()))
                    .await;
                StopOutcome::NotRunning
            }
            Some(mut process) => {
                if let Some(shutdown) = process.poller_shutdown.take() {
                    let _ = shutdown.send(true);
                }
                let _ = process.child.kill().await;
                let _ = process.child.wait().await;
                info!("stopped {}", kind.describe());
                self.logs
                    .append("CONSOLE", &format!("Stopped {}", kind.describe()))
                    .await;
                StopOutcome::Stopped
            }
        }
    }

    /// Whether a daemon kind is currently running, reaping it if it exited
    /// on its own.
    pub async fn is_running(&self, kind: ProcessKind) -> bool {
        let mut slot = self.slot(kind).lock().await;
        match slot.as_mut() {
            None => false,
            Some(process) => {
                if process_is_running(&mut process.child) {
                    true
                } else {
                    // Dropping the record also drops the poller's shutdown
                    // sender, which ends the poll loop.
                    *slot = None;
                    false
                }
            }
        }
    }

    /// Stop both daemons; safe to call with none running.
    pub async fn stop_all(&self) {
        self.stop(ProcessKind::Node).await;
        self.stop(ProcessKind::Wallet).await;
    }
}

fn process_is_running(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

/// Forward one child output stream into the aggregator, line-trimmed.
/// Exits when the pipe reaches end-of-stream after the child dies.
async fn forward_stream<R>(stream: R, tag: &'static str, logs: LogAggregator)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            logs.append(tag, trimmed).await;
        }
    }
}

/// Poll the node status endpoint until told to stop, publishing each
/// successful snapshot. Failures keep the previous snapshot; they are logged
/// only when the poller transitions from healthy to failing, so a daemon
/// that is down for minutes produces one warning, not one per tick.
async fn poll_node_telemetry<G: RpcGateway>(
    gateway: Arc<G>,
    telemetry: watch::Sender<TelemetrySnapshot>,
    port: u16,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut failing = false;
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(interval) => {
                match gateway.node_status(port).await {
                    Ok(snapshot) => {
                        if failing {
                            info!("node status poll recovered");
                        }
                        failing = false;
                        // send_replace stores the value even while nothing
                        // is subscribed, so late readers still see it.
                        telemetry.send_replace(snapshot);
                    }
                    Err(e) => {
                        if !failing {
                            warn!("node status poll failed: {e}");
                        }
                        failing = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockRpcGateway;
    use chrono::Local;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sleeper_spec() -> LaunchSpec {
        LaunchSpec {
            binary: PathBuf::from("sleep"),
            args: vec!["30".to_string()],
        }
    }

    fn echo_spec(text: &str) -> LaunchSpec {
        LaunchSpec {
            binary: PathBuf::from("echo"),
            args: vec![text.to_string()],
        }
    }

    fn supervisor_with(
        gateway: MockRpcGateway,
        kind: ProcessKind,
        spec: LaunchSpec,
    ) -> ProcessSupervisor<MockRpcGateway> {
        ProcessSupervisor::new(Arc::new(gateway), LogAggregator::new())
            .with_launch_spec(kind, spec)
    }

    #[tokio::test]
    async fn start_twice_is_a_noop() {
        let supervisor = supervisor_with(MockRpcGateway::new(), ProcessKind::Wallet, sleeper_spec());

        let first = supervisor.start(ProcessKind::Wallet).await.unwrap();
        let second = supervisor.start(ProcessKind::Wallet).await.unwrap();
        assert_eq!(first, StartOutcome::Started);
        assert_eq!(second, StartOutcome::AlreadyRunning);
        assert!(supervisor.is_running(ProcessKind::Wallet).await);

        assert_eq!(supervisor.stop(ProcessKind::Wallet).await, StopOutcome::Stopped);
    }

    #[tokio::test]
    async fn stop_when_not_running_is_a_noop() {
        let supervisor = supervisor_with(MockRpcGateway::new(), ProcessKind::Wallet, sleeper_spec());

        assert_eq!(
            supervisor.stop(ProcessKind::Wallet).await,
            StopOutcome::NotRunning
        );
        assert!(!supervisor.is_running(ProcessKind::Wallet).await);
    }

    #[tokio::test]
    async fn launch_failure_creates_no_record() {
        let spec = LaunchSpec {
            binary: PathBuf::from("/definitely/not/a/binary"),
            args: vec![],
        };
        let supervisor = supervisor_with(MockRpcGateway::new(), ProcessKind::Wallet, spec);

        let err = supervisor.start(ProcessKind::Wallet).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Launch { .. }));
        assert!(!supervisor.is_running(ProcessKind::Wallet).await);
    }

    #[tokio::test]
    async fn child_output_is_forwarded_into_the_logs() {
        let supervisor = supervisor_with(
            MockRpcGateway::new(),
            ProcessKind::Wallet,
            echo_spec("wallet says hi"),
        );

        supervisor.start(ProcessKind::Wallet).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let entries = supervisor.logs.snapshot().await;
        assert!(
            entries
                .iter()
                .any(|e| e.source == "WALLET" && e.text == "wallet says hi"),
            "expected echoed line in {entries:?}"
        );
    }

    #[tokio::test]
    async fn external_exit_is_detected_and_allows_restart() {
        let supervisor = supervisor_with(
            MockRpcGateway::new(),
            ProcessKind::Wallet,
            echo_spec("short lived"),
        );

        supervisor.start(ProcessKind::Wallet).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!supervisor.is_running(ProcessKind::Wallet).await);
        assert_eq!(
            supervisor.start(ProcessKind::Wallet).await.unwrap(),
            StartOutcome::Started
        );
        supervisor.stop(ProcessKind::Wallet).await;
    }

    #[tokio::test]
    async fn poller_publishes_telemetry_and_stops_with_the_node() {
        let polls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&polls);

        let mut gateway = MockRpcGateway::new();
        gateway.expect_node_status().returning(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(TelemetrySnapshot {
                height: 42,
                peer_count: 7,
                captured_at: Local::now(),
            })
        });

        let supervisor = supervisor_with(gateway, ProcessKind::Node, sleeper_spec())
            .with_poll_interval(Duration::from_millis(20));
        let subscription = supervisor.telemetry();

        supervisor.start(ProcessKind::Node).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let snapshot = supervisor.current_telemetry();
        assert_eq!(snapshot.height, 42);
        assert_eq!(snapshot.peer_count, 7);
        // A held subscription sees the same published value.
        assert_eq!(subscription.borrow().height, 42);
        assert!(polls.load(Ordering::SeqCst) > 0);

        supervisor.stop(ProcessKind::Node).await;
        // Let any poll that was already in flight finish before sampling.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_stop = polls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            polls.load(Ordering::SeqCst),
            after_stop,
            "poller kept running after stop"
        );
    }

    #[tokio::test]
    async fn poll_failures_keep_the_previous_snapshot() {
        let mut gateway = MockRpcGateway::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        gateway.expect_node_status().returning(move |_| {
            // First poll succeeds, everything after fails.
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(TelemetrySnapshot {
                    height: 100,
                    peer_count: 3,
                    captured_at: Local::now(),
                })
            } else {
                Err(ConsoleError::network("127.0.0.1:18081", "connection refused"))
            }
        });

        let supervisor = supervisor_with(gateway, ProcessKind::Node, sleeper_spec())
            .with_poll_interval(Duration::from_millis(20));

        supervisor.start(ProcessKind::Node).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(calls.load(Ordering::SeqCst) > 1);
        assert_eq!(supervisor.current_telemetry().height, 100);

        supervisor.stop(ProcessKind::Node).await;
    }
}
