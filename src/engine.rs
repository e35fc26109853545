//! Execution engine: drives one target through a sequence of test cases.
//!
//! Each payload goes through `Idle → Connecting → Sending → Receiving →
//! Classified` on a connection owned by the case being run. A case whose
//! exchange ends in [`ServerStatus::ConnectionClosed`] or
//! [`ServerStatus::ConnectionRefused`] triggers the health probe: after a grace
//! pause an anonymous bind is sent on a fresh connection. If the probe gets no
//! reply the current sequence is aborted, otherwise it continues.
//!
//! The engine is single-threaded. Its result log is append-only and records
//! cases in execution order. All logging happens inside the [`Span`] handed to
//! [`Engine::new`], so the caller decides how runs are labelled and filtered.
//! A [`StopHandle`] may be cloned to another thread to interrupt pacing sleeps
//! and end a run early. [`Engine::preflight`] checks that a target is usable
//! before any test case is sent.

use crate::analyze::{analyze_response, AnalysisKind};
use crate::catalog::{Catalog, TestCase};
use crate::message::{BindRequest, Envelope, SearchRequest};
use crate::transport::{Received, Transport, TransportError};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, trace, warn, Span};

pub const DEFAULT_PORT: u16 = 389;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);
pub const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(10);
pub const DEFAULT_PROBE_MESSAGE_ID: i64 = 999;
pub const DEFAULT_MAX_RESPONSE: usize = 65536;
/// Load mode logs progress every this many requests.
pub const LOAD_PROGRESS_EVERY: usize = 10;
/// Reserved tag octet with a short length and five content octets.
pub const PREFLIGHT_MALFORMED: [u8; 7] = [0xFF, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Responsive,
    NoResponse,
    ConnectionClosed,
    ConnectionRefused,
    Timeout,
    Error,
}

impl ServerStatus {
    pub const ALL: [ServerStatus; 6] = [
        ServerStatus::Responsive,
        ServerStatus::NoResponse,
        ServerStatus::ConnectionClosed,
        ServerStatus::ConnectionRefused,
        ServerStatus::Timeout,
        ServerStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServerStatus::Responsive => "responsive",
            ServerStatus::NoResponse => "no_response",
            ServerStatus::ConnectionClosed => "connection_closed",
            ServerStatus::ConnectionRefused => "connection_refused",
            ServerStatus::Timeout => "timeout",
            ServerStatus::Error => "error",
        }
    }

    /// Statuses that may mean the target crashed.
    pub fn is_crash_signal(self) -> bool {
        matches!(self, ServerStatus::ConnectionClosed | ServerStatus::ConnectionRefused)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed payload. Never modified after it is logged.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzResult {
    pub test_id: String,
    pub test_name: String,
    pub description: String,
    pub packet_sent: Vec<u8>,
    /// `Some(empty)` when the peer closed; `None` when nothing was read.
    pub response: Option<Vec<u8>>,
    pub status: ServerStatus,
    pub response_time: Duration,
    pub error: Option<String>,
    /// Seconds since the Unix epoch when the exchange finished.
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    /// Bound on each connect, send and receive.
    pub timeout: Duration,
    /// Pause between consecutive cases.
    pub delay: Duration,
    /// Pause before the health probe.
    pub grace: Duration,
    /// Pause between requests in load mode.
    pub load_delay: Duration,
    pub health_check: bool,
    pub probe_message_id: i64,
    pub max_response_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            grace: DEFAULT_GRACE,
            load_delay: DEFAULT_LOAD_DELAY,
            health_check: true,
            probe_message_id: DEFAULT_PROBE_MESSAGE_ID,
            max_response_size: DEFAULT_MAX_RESPONSE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Target stopped answering; `after` is the id of the last case run.
    Aborted { after: String },
    /// Stopped through a [`StopHandle`].
    Interrupted,
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::Aborted { after } => write!(f, "aborted after {} (target unresponsive)", after),
            RunStatus::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// Totals for one run of a case sequence (suite, iteration batch, mutation batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub label: String,
    pub executed: usize,
    pub responsive: usize,
    pub crashed_or_closed: usize,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRun {
    pub suites: Vec<SuiteSummary>,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub requests: usize,
    pub elapsed_secs: f64,
    pub requests_per_sec: f64,
    pub mean_response_secs: f64,
    pub status: RunStatus,
}

/// Cancels pacing sleeps and ends runs at the next case boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopHandle {
    pub fn new() -> Self {
        StopHandle::default()
    }

    pub fn stop(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock() = true;
        cvar.notify_all();
    }

    pub fn reset(&self) {
        *self.inner.0.lock() = false;
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleep for `dur` unless stopped first. Returns true if stopped.
    pub fn sleep(&self, dur: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + dur;
        let mut stopped = flag.lock();
        while !*stopped {
            if cvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseState {
    Idle,
    Connecting,
    Sending,
    Receiving,
    Classified(ServerStatus),
}

/// Outcome of [`Engine::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Alive,
    Dead,
    /// The grace pause was cut short by a [`StopHandle`]; no probe was sent.
    Interrupted,
}

enum Recovery {
    Continue,
    Abort,
    Interrupted,
}

/// One readiness check run by [`Engine::preflight`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightCheck {
    pub name: &'static str,
    pub passed: bool,
    pub note: String,
}

impl PreflightCheck {
    fn new(name: &'static str, passed: bool, note: impl Into<String>) -> Self {
        PreflightCheck { name, passed, note: note.into() }
    }
}

/// The target is worth testing: it accepts connections and passes at least one
/// other check.
pub fn preflight_ready(checks: &[PreflightCheck]) -> bool {
    checks.first().is_some_and(|c| c.passed) && checks.iter().filter(|c| c.passed).count() >= 2
}

/// Holds at most one open connection and closes it on every exit path.
struct ConnGuard<'a, T: Transport> {
    transport: &'a mut T,
    conn: Option<T::Conn>,
}

impl<'a, T: Transport> ConnGuard<'a, T> {
    fn new(transport: &'a mut T) -> Self {
        ConnGuard { transport, conn: None }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), TransportError> {
        self.disconnect();
        self.conn = Some(self.transport.connect(host, port, timeout)?);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match self.conn.as_mut() {
            Some(conn) => self.transport.send(conn, bytes),
            None => Err(TransportError::Other("not connected".to_string())),
        }
    }

    fn receive(&mut self, max_size: usize, timeout: Duration) -> Result<Received, TransportError> {
        match self.conn.as_mut() {
            Some(conn) => self.transport.receive(conn, max_size, timeout),
            None => Err(TransportError::Other("not connected".to_string())),
        }
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.transport.close(conn);
        }
    }
}

impl<'a, T: Transport> Drop for ConnGuard<'a, T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn connect_status(err: &TransportError) -> ServerStatus {
    match err {
        TransportError::Refused(_) => ServerStatus::ConnectionRefused,
        TransportError::Timeout(_) => ServerStatus::Timeout,
        TransportError::Reset(_) => ServerStatus::ConnectionClosed,
        TransportError::Other(_) => ServerStatus::Error,
    }
}

fn exchange_status(err: &TransportError) -> ServerStatus {
    match err {
        TransportError::Reset(_) | TransportError::Refused(_) => ServerStatus::ConnectionClosed,
        TransportError::Timeout(_) => ServerStatus::Timeout,
        TransportError::Other(_) => ServerStatus::Error,
    }
}

/// Send `bytes` on the guarded connection and wait for the reply.
fn request<T: Transport>(guard: &mut ConnGuard<'_, T>, config: &EngineConfig, bytes: &[u8]) -> Result<Received, TransportError> {
    guard.send(bytes)?;
    guard.receive(config.max_response_size, config.timeout)
}

fn describe_reply(reply: &Result<Received, TransportError>) -> String {
    match reply {
        Ok(Received::Data(bytes)) if !bytes.is_empty() => {
            let analysis = analyze_response(Some(bytes.as_slice()));
            format!("{} bytes, {}", bytes.len(), analysis.notes)
        }
        Ok(Received::Data(_)) | Ok(Received::Closed) => "connection closed".to_string(),
        Ok(Received::Nothing) => "no response".to_string(),
        Err(e) => e.to_string(),
    }
}

fn answered(reply: &Result<Received, TransportError>) -> bool {
    matches!(reply, Ok(Received::Data(bytes)) if !bytes.is_empty())
}

fn unix_now() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64()).unwrap_or(0.0)
}

/// Send each payload of `case` in order over one connection, reconnecting when an
/// exchange ends it. One result per payload.
fn execute_case<T: Transport>(transport: &mut T, config: &EngineConfig, case: &TestCase) -> Vec<FuzzResult> {
    let mut guard = ConnGuard::new(transport);
    let mut out = Vec::with_capacity(case.payloads.len());
    let multi = case.is_multi_payload();

    for (i, payload) in case.payloads.iter().enumerate() {
        let test_id = if multi { format!("{}/p{}", case.id, i + 1) } else { case.id.clone() };
        trace!(test_id = %test_id, state = ?CaseState::Idle);
        let start = Instant::now();

        let (status, response, error) = 'exchange: {
            if !guard.is_open() {
                trace!(test_id = %test_id, state = ?CaseState::Connecting);
                if let Err(e) = guard.connect(&config.host, config.port, config.timeout) {
                    break 'exchange (connect_status(&e), None, Some(e.to_string()));
                }
            }

            trace!(test_id = %test_id, state = ?CaseState::Sending, bytes = payload.len());
            if let Err(e) = guard.send(payload) {
                guard.disconnect();
                break 'exchange (exchange_status(&e), None, Some(e.to_string()));
            }

            trace!(test_id = %test_id, state = ?CaseState::Receiving);
            match guard.receive(config.max_response_size, config.timeout) {
                Ok(Received::Data(bytes)) if !bytes.is_empty() => (ServerStatus::Responsive, Some(bytes), None),
                Ok(Received::Data(_)) | Ok(Received::Closed) => {
                    guard.disconnect();
                    (ServerStatus::ConnectionClosed, Some(Vec::new()), None)
                }
                Ok(Received::Nothing) => (ServerStatus::NoResponse, None, None),
                Err(e) => {
                    guard.disconnect();
                    (exchange_status(&e), None, Some(e.to_string()))
                }
            }
        };

        let response_time = start.elapsed();
        trace!(test_id = %test_id, state = ?CaseState::Classified(status));
        info!(
            test_id = %test_id,
            status = %status,
            response_bytes = response.as_ref().map_or(0, Vec::len),
            elapsed_ms = response_time.as_secs_f64() * 1000.0,
            "{}",
            case.name
        );
        out.push(FuzzResult {
            test_id,
            test_name: case.name.clone(),
            description: case.description.clone(),
            packet_sent: payload.clone(),
            response,
            status,
            response_time,
            error,
            timestamp: unix_now(),
        });
    }
    out
}

pub struct Engine<T: Transport> {
    transport: T,
    config: EngineConfig,
    span: Span,
    stop: StopHandle,
    results: Vec<FuzzResult>,
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T, config: EngineConfig, span: Span) -> Self {
        Engine { transport, config, span, stop: StopHandle::new(), results: Vec::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle for interrupting runs from another thread. A stop stays in effect
    /// until [`StopHandle::reset`]: later runs on this engine return
    /// [`RunStatus::Interrupted`] before executing anything.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn results(&self) -> &[FuzzResult] {
        &self.results
    }

    pub fn take_results(&mut self) -> Vec<FuzzResult> {
        std::mem::take(&mut self.results)
    }

    /// Forget all results, e.g. between independent runs.
    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Run one case and log its results. Returns the results just appended.
    pub fn run_case(&mut self, case: &TestCase) -> &[FuzzResult] {
        let span = self.span.clone();
        let _enter = span.enter();
        let first = self.results.len();
        let results = execute_case(&mut self.transport, &self.config, case);
        self.results.extend(results);
        &self.results[first..]
    }

    /// Anonymous bind on a fresh connection after the grace pause. Alive if any
    /// bytes came back.
    pub fn probe(&mut self) -> Health {
        let span = self.span.clone();
        let _enter = span.enter();
        if self.stop.sleep(self.config.grace) {
            debug!("health probe skipped, run stopped");
            return Health::Interrupted;
        }
        let bind = Envelope::new(self.config.probe_message_id, BindRequest::anonymous()).encode();
        let mut guard = ConnGuard::new(&mut self.transport);
        let alive = guard
            .connect(&self.config.host, self.config.port, self.config.timeout)
            .and_then(|_| guard.send(&bind))
            .and_then(|_| guard.receive(self.config.max_response_size, self.config.timeout));
        match alive {
            Ok(Received::Data(bytes)) if !bytes.is_empty() => {
                debug!(bytes = bytes.len(), "health probe answered");
                Health::Alive
            }
            Ok(other) => {
                debug!(?other, "health probe got no data");
                Health::Dead
            }
            Err(e) => {
                debug!(error = %e, "health probe failed");
                Health::Dead
            }
        }
    }

    fn recover(&mut self, case_id: &str, statuses: &[ServerStatus]) -> Recovery {
        if !self.config.health_check || !statuses.iter().any(|s| s.is_crash_signal()) {
            return Recovery::Continue;
        }
        let span = self.span.clone();
        let _enter = span.enter();
        warn!(test_id = case_id, "connection lost, checking server health");
        match self.probe() {
            Health::Alive => {
                warn!(test_id = case_id, "server answered health probe, continuing");
                Recovery::Continue
            }
            Health::Dead => {
                error!(test_id = case_id, "server is not responding to health probe");
                Recovery::Abort
            }
            Health::Interrupted => Recovery::Interrupted,
        }
    }

    /// Readiness checks before a run: TCP connect, anonymous bind, root DSE
    /// search for `(objectClass=*)`, and the reaction to [`PREFLIGHT_MALFORMED`].
    /// Stops after the first check when the target cannot be reached. Nothing is
    /// added to the result log.
    pub fn preflight(&mut self) -> Vec<PreflightCheck> {
        let span = self.span.clone();
        let _enter = span.enter();
        let config = &self.config;
        let mut checks = Vec::with_capacity(4);

        let mut guard = ConnGuard::new(&mut self.transport);
        let connected = guard.connect(&config.host, config.port, config.timeout);
        guard.disconnect();
        match connected {
            Ok(()) => checks.push(PreflightCheck::new("tcp_connect", true, "connected")),
            Err(e) => {
                error!(error = %e, "target is not reachable");
                checks.push(PreflightCheck::new("tcp_connect", false, e.to_string()));
                return checks;
            }
        }

        let bind = Envelope::new(1, BindRequest::anonymous()).encode();
        let reply = guard
            .connect(&config.host, config.port, config.timeout)
            .and_then(|_| request(&mut guard, config, &bind));
        guard.disconnect();
        checks.push(PreflightCheck::new("anonymous_bind", answered(&reply), describe_reply(&reply)));

        let search = Envelope::new(2, SearchRequest::default()).encode();
        let reply = guard
            .connect(&config.host, config.port, config.timeout)
            .and_then(|_| request(&mut guard, config, &bind))
            .and_then(|_| request(&mut guard, config, &search));
        guard.disconnect();
        checks.push(PreflightCheck::new("root_dse_search", answered(&reply), describe_reply(&reply)));

        // any reaction except silence counts as handling the bad input
        let reply = guard
            .connect(&config.host, config.port, config.timeout)
            .and_then(|_| request(&mut guard, config, &PREFLIGHT_MALFORMED));
        guard.disconnect();
        let (passed, note) = match &reply {
            Ok(Received::Data(bytes)) if !bytes.is_empty() => {
                let analysis = analyze_response(Some(bytes.as_slice()));
                let note = if analysis.kind == AnalysisKind::ProtocolError {
                    "rejected with protocolError".to_string()
                } else {
                    format!("answered: {}", analysis.notes)
                };
                (true, note)
            }
            Ok(Received::Data(_)) | Ok(Received::Closed) | Err(TransportError::Reset(_)) => {
                (true, "connection closed".to_string())
            }
            Ok(Received::Nothing) | Err(TransportError::Timeout(_)) => (false, "no reaction, possible hang".to_string()),
            Err(e) => (false, e.to_string()),
        };
        checks.push(PreflightCheck::new("malformed_rejection", passed, note));

        for check in &checks {
            if check.passed {
                info!(check = check.name, note = %check.note, "preflight passed");
            } else {
                warn!(check = check.name, note = %check.note, "preflight failed");
            }
        }
        checks
    }

    /// Run cases in order with crash detection and pacing; stops at the first
    /// unrecoverable case.
    pub fn run_sequence(&mut self, label: &str, cases: impl IntoIterator<Item = TestCase>) -> SuiteSummary {
        let span = self.span.clone();
        let _enter = span.enter();
        info!(label, "starting");

        let mut summary = SuiteSummary {
            label: label.to_string(),
            executed: 0,
            responsive: 0,
            crashed_or_closed: 0,
            status: RunStatus::Completed,
        };
        let mut cases = cases.into_iter().peekable();
        while let Some(case) = cases.next() {
            if self.stop.is_stopped() {
                summary.status = RunStatus::Interrupted;
                break;
            }
            let statuses: Vec<ServerStatus> = self.run_case(&case).iter().map(|r| r.status).collect();
            summary.executed += 1;
            if statuses.iter().all(|s| *s == ServerStatus::Responsive) {
                summary.responsive += 1;
            }
            if statuses.iter().any(|s| s.is_crash_signal()) {
                summary.crashed_or_closed += 1;
            }
            match self.recover(&case.id, &statuses) {
                Recovery::Continue => {}
                Recovery::Abort => {
                    summary.status = RunStatus::Aborted { after: case.id.clone() };
                    break;
                }
                Recovery::Interrupted => {
                    summary.status = RunStatus::Interrupted;
                    break;
                }
            }
            if cases.peek().is_some() && self.stop.sleep(self.config.delay) {
                summary.status = RunStatus::Interrupted;
                break;
            }
        }

        info!(
            label,
            executed = summary.executed,
            responsive = summary.responsive,
            crashed_or_closed = summary.crashed_or_closed,
            status = %summary.status,
            "finished"
        );
        summary
    }

    /// Single-pass mode: every selected suite once, in order. An aborted suite does
    /// not stop later suites; the overall status records the first abort.
    pub fn run_catalog(&mut self, catalog: &Catalog) -> CatalogRun {
        let mut run = CatalogRun { suites: Vec::new(), status: RunStatus::Completed };
        for suite in catalog.suites() {
            let summary = self.run_sequence(&suite.to_string(), suite.cases());
            let status = summary.status.clone();
            run.suites.push(summary);
            match status {
                RunStatus::Completed => {}
                RunStatus::Aborted { .. } => {
                    if run.status.is_completed() {
                        run.status = status;
                    }
                }
                RunStatus::Interrupted => {
                    run.status = RunStatus::Interrupted;
                    break;
                }
            }
        }
        run
    }

    /// Iteration mode: the whole case list `iterations` times, ids suffixed `.iterK`.
    pub fn run_iterations(&mut self, cases: &[TestCase], iterations: usize) -> SuiteSummary {
        let relabelled = (1..=iterations).flat_map(|k| {
            cases
                .iter()
                .map(move |c| c.relabel(format!("{}.iter{}", c.id, k), format!("{} (Iteration {})", c.name, k)))
        });
        self.run_sequence(&format!("iteration x{}", iterations), relabelled)
    }

    /// Mutation mode: generated cases run like a suite.
    pub fn run_mutations(&mut self, mutations: Vec<TestCase>) -> SuiteSummary {
        self.run_sequence("mutation", mutations)
    }

    /// Load mode: cycle through `corpus` for `duration` at the load pacing, never
    /// aborting on connection loss. The configured delay is restored on return.
    pub fn run_load(&mut self, corpus: &[TestCase], duration: Duration) -> LoadReport {
        let span = self.span.clone();
        let _enter = span.enter();
        info!(cases = corpus.len(), duration_secs = duration.as_secs_f64(), "load test starting");

        let saved_delay = self.config.delay;
        self.config.delay = self.config.load_delay;

        let first = self.results.len();
        let start = Instant::now();
        let mut status = RunStatus::Completed;
        let mut n = 0usize;
        while !corpus.is_empty() && start.elapsed() < duration {
            if self.stop.is_stopped() {
                status = RunStatus::Interrupted;
                break;
            }
            let base = &corpus[n % corpus.len()];
            n += 1;
            let case = base.relabel(format!("LOAD.{}", n), format!("Load Test {}: {}", n, base.name));
            if self.run_case(&case).iter().any(|r| r.status.is_crash_signal()) {
                warn!(test_id = %case.id, "connection issues during load test");
            }
            if n % LOAD_PROGRESS_EVERY == 0 {
                let elapsed = start.elapsed().as_secs_f64();
                let rate = if elapsed > 0.0 { n as f64 / elapsed } else { 0.0 };
                info!(requests = n, elapsed_secs = elapsed, rate, "load test progress");
            }
            if self.stop.sleep(self.config.delay) {
                status = RunStatus::Interrupted;
                break;
            }
        }

        self.config.delay = saved_delay;

        let elapsed = start.elapsed().as_secs_f64();
        let executed = &self.results[first..];
        let requests = executed.len();
        let mean_response_secs = if requests > 0 {
            executed.iter().map(|r| r.response_time.as_secs_f64()).sum::<f64>() / requests as f64
        } else {
            0.0
        };
        let report = LoadReport {
            requests,
            elapsed_secs: elapsed,
            requests_per_sec: if elapsed > 0.0 { requests as f64 / elapsed } else { 0.0 },
            mean_response_secs,
            status,
        };
        info!(
            requests = report.requests,
            elapsed_secs = report.elapsed_secs,
            rate = report.requests_per_sec,
            mean_response_secs = report.mean_response_secs,
            "load test finished"
        );
        report
    }
}
