//! TCP device session with liveness probing and auto-reconnect

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::BytesMut;
use obd_protocol::codec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, info, warn};

use crate::commands;
use crate::config::TcpLinkConfig;
use crate::error::LinkError;
use crate::link::ObdLink;

const RECONNECT_DELAY_MS: u64 = 1000;

/// Idle window after the probe write in which stale bytes are drained
const PROBE_DRAIN_MS: u64 = 20;

/// `ATZ` reboots the adapter; give the banner extra time to arrive
const RESET_DEADLINE_FACTOR: u32 = 2;

/// The one shared session to the OBD device.
///
/// All command execution serializes through an internal gate: the session
/// owns at most one transport and guarantees exactly one in-flight
/// exchange across all callers, served in arrival order (the gate is
/// tokio's fair `Mutex`). The transport is established lazily on first
/// use and replaced transparently when the liveness probe or an exchange
/// fails. The adapter protocol is half-duplex; a second writer on the
/// same line would interleave with a pending reader's reply, so nothing
/// outside this type may touch the transport.
pub struct DeviceSession {
    config: TcpLinkConfig,
    inner: Mutex<SessionInner>,
    connected: AtomicBool,
}

/// Transport state guarded by the session gate
struct SessionInner {
    stream: Option<TcpStream>,
    last_exchange: Option<Instant>,
}

impl DeviceSession {
    /// Create a session; no connection is made until the first command
    pub fn new(config: TcpLinkConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(SessionInner {
                stream: None,
                last_exchange: None,
            }),
            connected: AtomicBool::new(false),
        }
    }

    fn response_deadline(&self, cmd: &str) -> Duration {
        let base = Duration::from_millis(self.config.response_timeout_ms);
        if cmd.eq_ignore_ascii_case(commands::RESET) {
            base * RESET_DEADLINE_FACTOR
        } else {
            base
        }
    }

    /// Probe the current transport and reconnect if it is dead.
    ///
    /// The probe writes a bare `\r` and drains whatever the device
    /// buffered since the last exchange. EOF during the drain means the
    /// peer closed while we were idle; silence means the line is healthy
    /// and clean for the next exchange.
    async fn ensure_ready(&self, inner: &mut SessionInner) -> Result<(), LinkError> {
        if let Some(stream) = inner.stream.as_mut() {
            match probe(stream).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(endpoint = %self.config.endpoint(), %e, "Device link stale, reconnecting");
                    inner.stream = None;
                    self.connected.store(false, Ordering::SeqCst);
                }
            }
        }
        self.connect_with_retry(inner).await
    }

    /// Connect with retry logic
    async fn connect_with_retry(&self, inner: &mut SessionInner) -> Result<(), LinkError> {
        let max_attempts = self.config.connect_attempts.max(1);
        let mut last_error = LinkError::ConnectionUnavailable("no attempt made".into());

        for attempt in 1..=max_attempts {
            match self.connect(inner).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(attempt, max_attempts, %e, "Device connection failed");
                    last_error = e;
                    if attempt < max_attempts {
                        time::sleep(Duration::from_millis(RECONNECT_DELAY_MS)).await;
                    }
                }
            }
        }
        Err(last_error)
    }

    async fn connect(&self, inner: &mut SessionInner) -> Result<(), LinkError> {
        let addr = self.config.endpoint();
        let timeout = Duration::from_millis(self.config.connect_timeout_ms);

        info!(%addr, "Connecting to OBD device");

        let stream = time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| LinkError::ConnectionUnavailable(format!("connect timeout to {addr}")))?
            .map_err(|e| LinkError::ConnectionUnavailable(e.to_string()))?;

        inner.stream = Some(stream);
        inner.last_exchange = None;

        if self.config.init_on_connect {
            if let Err(e) = self.run_init(inner).await {
                // discard the half-initialized transport so a later call
                // cannot adopt an unconfigured adapter
                inner.stream = None;
                return Err(e);
            }
        }

        self.connected.store(true, Ordering::SeqCst);
        info!(%addr, "Device link established");
        Ok(())
    }

    /// Run the adapter init sequence on a fresh connection.
    ///
    /// A non-OK reply is logged and tolerated; only transport failures
    /// abort the connect.
    async fn run_init(&self, inner: &mut SessionInner) -> Result<(), LinkError> {
        let deadline = self.response_deadline(commands::RESET);
        let banner = self.exchange(inner, commands::RESET, deadline).await?;
        info!(banner = %codec::clean(&banner), "Adapter reset");

        for cmd in commands::INIT_SEQUENCE {
            let reply = self.exchange(inner, cmd, self.response_deadline(cmd)).await?;
            let reply = codec::clean(&reply);
            if !reply.eq_ignore_ascii_case("OK") {
                warn!(cmd, %reply, "Init command not acknowledged");
            }
        }
        Ok(())
    }

    /// One paced write/read exchange on the current transport
    async fn exchange(
        &self,
        inner: &mut SessionInner,
        cmd: &str,
        deadline: Duration,
    ) -> Result<String, LinkError> {
        // the adapter drops commands that arrive too close together
        if let Some(at) = inner.last_exchange {
            let min_gap = Duration::from_millis(self.config.min_command_interval_ms);
            let since = at.elapsed();
            if since < min_gap {
                time::sleep(min_gap - since).await;
            }
        }

        let stream = inner
            .stream
            .as_mut()
            .ok_or_else(|| LinkError::ConnectionUnavailable("no transport".into()))?;

        debug!(cmd, "Sending device command");
        stream
            .write_all(codec::encode(cmd).as_bytes())
            .await
            .map_err(|e| LinkError::SendFailed(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| LinkError::SendFailed(e.to_string()))?;

        let raw = read_until_prompt(stream, deadline, self.config.max_response_bytes).await?;
        inner.last_exchange = Some(Instant::now());

        let text = String::from_utf8_lossy(&raw).trim().to_string();
        debug!(cmd, response = ?text, "Device response");
        Ok(text)
    }
}

#[async_trait]
impl ObdLink for DeviceSession {
    async fn execute(&self, cmd: &str) -> Result<String, LinkError> {
        let mut inner = self.inner.lock().await;
        self.ensure_ready(&mut inner).await?;

        let deadline = self.response_deadline(cmd);
        match self.exchange(&mut inner, cmd, deadline).await {
            Ok(text) => Ok(text),
            Err(e) => {
                // discard the transport so the next call reconnects
                inner.stream = None;
                self.connected.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        self.config.endpoint()
    }
}

/// Write the liveness probe and drain stale bytes
async fn probe(stream: &mut TcpStream) -> io::Result<()> {
    stream.write_all(b"\r").await?;
    stream.flush().await?;

    let mut scratch = [0u8; 256];
    loop {
        let drain = Duration::from_millis(PROBE_DRAIN_MS);
        match time::timeout(drain, stream.read(&mut scratch)).await {
            Ok(Ok(0)) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                ));
            }
            Ok(Ok(_)) => continue,
            Ok(Err(e)) => return Err(e),
            // silence: nothing stale buffered, the line is healthy
            Err(_) => return Ok(()),
        }
    }
}

/// Accumulate a response until the `>` prompt, an idle deadline, or the
/// buffer cap. A deadline with a non-empty buffer returns the partial
/// text (devices without a prompt still work); a deadline with nothing
/// read fails as a timeout.
async fn read_until_prompt(
    stream: &mut TcpStream,
    deadline: Duration,
    cap: usize,
) -> Result<BytesMut, LinkError> {
    let mut buf = BytesMut::with_capacity(256);

    loop {
        let scanned = buf.len();
        match time::timeout(deadline, stream.read_buf(&mut buf)).await {
            Ok(Ok(0)) => {
                return Err(LinkError::ReceiveFailed("connection closed mid-read".into()));
            }
            Ok(Ok(_)) => {
                if buf[scanned..].contains(&b'>') || buf.len() >= cap {
                    buf.truncate(cap);
                    return Ok(buf);
                }
            }
            Ok(Err(e)) => return Err(LinkError::ReceiveFailed(e.to_string())),
            Err(_) if buf.is_empty() => return Err(LinkError::Timeout),
            Err(_) => return Ok(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    use parking_lot::Mutex as SyncMutex;
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    /// Scripted device: accumulates bytes to `\r`, replies through a
    /// closure, stays silent on empty commands (the liveness probe), and
    /// records every line it saw. `replies_per_conn` closes the socket
    /// after that many replies, simulating a flaky adapter.
    struct ScriptedDevice {
        addr: SocketAddr,
        seen: Arc<SyncMutex<Vec<String>>>,
        accepts: Arc<AtomicU32>,
    }

    impl ScriptedDevice {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    async fn spawn_device<F>(reply: F, replies_per_conn: Option<u32>) -> ScriptedDevice
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(SyncMutex::new(Vec::new()));
        let accepts = Arc::new(AtomicU32::new(0));
        let reply = Arc::new(reply);

        {
            let seen = seen.clone();
            let accepts = accepts.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        break;
                    };
                    accepts.fetch_add(1, Ordering::SeqCst);
                    let seen = seen.clone();
                    let reply = reply.clone();
                    tokio::spawn(async move {
                        let mut line = Vec::new();
                        let mut byte = [0u8; 1];
                        let mut replies = 0u32;
                        loop {
                            match socket.read(&mut byte).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) if byte[0] == b'\r' => {
                                    let cmd =
                                        String::from_utf8_lossy(&line).trim().to_string();
                                    line.clear();
                                    seen.lock().push(cmd.clone());
                                    if cmd.is_empty() {
                                        continue;
                                    }
                                    if let Some(text) = reply(&cmd) {
                                        if socket.write_all(text.as_bytes()).await.is_err() {
                                            break;
                                        }
                                        replies += 1;
                                        if replies_per_conn.is_some_and(|max| replies >= max) {
                                            break;
                                        }
                                    }
                                }
                                Ok(_) => line.push(byte[0]),
                            }
                        }
                    });
                }
            });
        }

        ScriptedDevice {
            addr,
            seen,
            accepts,
        }
    }

    fn test_config(addr: SocketAddr) -> TcpLinkConfig {
        TcpLinkConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            connect_timeout_ms: 1000,
            response_timeout_ms: 200,
            min_command_interval_ms: 0,
            max_response_bytes: 1024,
            connect_attempts: 1,
            init_on_connect: false,
        }
    }

    fn elm_table(cmd: &str) -> Option<String> {
        let reply = match cmd {
            "ATZ" => "\r\rELM327 v1.5\r\r>",
            "ATE0" | "ATL0" | "ATH0" | "ATSP0" => "OK\r\r>",
            "010C" => "41 0C 1A F8\r\r>",
            "010D" => "41 0D 5A\r\r>",
            _ => "?\r\r>",
        };
        Some(reply.to_string())
    }

    #[tokio::test]
    async fn test_execute_connects_lazily_and_reads_to_prompt() {
        let device = spawn_device(elm_table, None).await;
        let session = DeviceSession::new(test_config(device.addr));
        assert!(!session.is_connected().await);

        let response = session.execute("010C").await.unwrap();
        assert_eq!(response, "41 0C 1A F8\r\r>");
        assert!(session.is_connected().await);
        assert_eq!(device.accepts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_execute_reuses_transport_through_probe() {
        let device = spawn_device(elm_table, None).await;
        let session = DeviceSession::new(test_config(device.addr));

        session.execute("010C").await.unwrap();
        let response = session.execute("010D").await.unwrap();

        assert_eq!(response, "41 0D 5A\r\r>");
        assert_eq!(device.accepts.load(Ordering::SeqCst), 1);
        // the probe shows up as an empty line between the commands
        assert_eq!(device.seen(), ["010C", "", "010D"]);
    }

    #[tokio::test]
    async fn test_init_sequence_runs_on_connect() {
        let device = spawn_device(elm_table, None).await;
        let mut config = test_config(device.addr);
        config.init_on_connect = true;

        let session = DeviceSession::new(config);
        let response = session.execute("010C").await.unwrap();

        assert_eq!(response, "41 0C 1A F8\r\r>");
        assert_eq!(
            device.seen(),
            ["ATZ", "ATE0", "ATL0", "ATH0", "ATSP0", "010C"]
        );
    }

    #[tokio::test]
    async fn test_failed_init_discards_transport_and_reinits() {
        // the device swallows the first ATZ, so the first connect's init
        // times out before any configuration command is acknowledged
        let swallowed = Arc::new(AtomicBool::new(false));
        let device = {
            let swallowed = swallowed.clone();
            spawn_device(
                move |cmd| {
                    if cmd == "ATZ" && !swallowed.swap(true, Ordering::SeqCst) {
                        return None;
                    }
                    elm_table(cmd)
                },
                None,
            )
            .await
        };
        let mut config = test_config(device.addr);
        config.init_on_connect = true;

        let session = DeviceSession::new(config);
        let err = session.execute("010C").await.unwrap_err();
        assert!(matches!(err, LinkError::Timeout));
        assert!(!session.is_connected().await);

        // the next call must not adopt the leftover socket: it reconnects
        // and completes the whole init sequence before the data command
        let response = session.execute("010C").await.unwrap();
        assert_eq!(response, "41 0C 1A F8\r\r>");
        assert!(session.is_connected().await);
        assert_eq!(device.accepts.load(Ordering::SeqCst), 2);
        assert_eq!(
            device.seen(),
            ["ATZ", "ATZ", "ATE0", "ATL0", "ATH0", "ATSP0", "010C"]
        );
    }

    #[tokio::test]
    async fn test_reconnects_when_peer_closed_while_idle() {
        // device drops each connection after a single reply
        let device = spawn_device(elm_table, Some(1)).await;
        let session = DeviceSession::new(test_config(device.addr));

        assert_eq!(session.execute("010C").await.unwrap(), "41 0C 1A F8\r\r>");
        // probe drain sees EOF, session reconnects transparently
        assert_eq!(session.execute("010D").await.unwrap(), "41 0D 5A\r\r>");
        assert_eq!(device.accepts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_silent_device_times_out_and_discards_transport() {
        let device = spawn_device(|_| None, None).await;
        let session = DeviceSession::new(test_config(device.addr));

        let err = session.execute("010C").await.unwrap_err();
        assert!(matches!(err, LinkError::Timeout));
        assert!(!session.is_connected().await);

        // next call reconnects rather than reusing the poisoned handle
        let _ = session.execute("010C").await;
        assert_eq!(device.accepts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_partial_response_without_prompt_is_returned() {
        let device = spawn_device(|_| Some("41 0C 1A F8".to_string()), None).await;
        let session = DeviceSession::new(test_config(device.addr));

        let response = session.execute("010C").await.unwrap();
        assert_eq!(response, "41 0C 1A F8");
    }

    #[tokio::test]
    async fn test_unreachable_device_is_connection_unavailable() {
        // bind and drop to get a port that refuses connections
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session = DeviceSession::new(test_config(addr));
        let err = session.execute("010C").await.unwrap_err();
        assert!(matches!(err, LinkError::ConnectionUnavailable(_)));
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_exchanges_are_paced() {
        let device = spawn_device(elm_table, None).await;
        let mut config = test_config(device.addr);
        config.min_command_interval_ms = 150;

        let session = DeviceSession::new(config);
        session.execute("010C").await.unwrap();

        let start = Instant::now();
        session.execute("010D").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_callers_all_complete() {
        let device = spawn_device(elm_table, None).await;
        let session = Arc::new(DeviceSession::new(test_config(device.addr)));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let session = session.clone();
            handles.push(tokio::spawn(async move { session.execute("010C").await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "41 0C 1A F8\r\r>");
        }
        // one shared transport serves every caller
        assert_eq!(device.accepts.load(Ordering::SeqCst), 1);
    }
}
