#![allow(dead_code)]

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

pub fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_esc-trigger"))
}

/// Spawn the listener pointed at `socket` with stderr captured.
pub fn spawn_listener(socket: &Path) -> Child {
    binary()
        .arg("listen")
        .arg("--socket")
        .arg(socket)
        .env("RUST_LOG", "esc_trigger=debug")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn esc-trigger")
}

/// Wait for the child to exit, killing it after [`TIMEOUT`].
pub fn wait_for_exit(child: &mut Child) -> (ExitStatus, String) {
    let deadline = Instant::now() + TIMEOUT;
    let status = loop {
        if let Some(status) = child.try_wait().expect("try_wait failed") {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("esc-trigger did not exit");
        }
        std::thread::sleep(Duration::from_millis(20));
    };

    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }
    (status, stderr)
}

/// Plays the terminal host for one spawned listener.
pub struct HostHarness {
    _dir: TempDir,
    listener: UnixListener,
    child: Option<Child>,
    writer: Option<UnixStream>,
    reader: Option<BufReader<UnixStream>>,
}

impl HostHarness {
    pub fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let socket = dir.path().join("host.sock");
        let listener = UnixListener::bind(&socket).expect("Failed to bind host socket");
        let child = spawn_listener(&socket);

        Self {
            _dir: dir,
            listener,
            child: Some(child),
            writer: None,
            reader: None,
        }
    }

    pub fn accept(&mut self) {
        self.listener.set_nonblocking(true).unwrap();
        let deadline = Instant::now() + TIMEOUT;
        let stream = loop {
            match self.listener.accept() {
                Ok((stream, _)) => break stream,
                Err(e) if e.kind() == ErrorKind::WouldBlock && Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(e) => panic!("Listener never connected: {e}"),
            }
        };
        stream.set_nonblocking(false).unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();

        self.reader = Some(BufReader::new(stream.try_clone().unwrap()));
        self.writer = Some(stream);
    }

    /// Next request line from the listener, or `None` once it hung up.
    pub fn read_request(&mut self) -> Option<Value> {
        let reader = self.reader.as_mut()?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(serde_json::from_str(&line).expect("Request is not JSON")),
        }
    }

    pub fn send(&mut self, message: &Value) {
        let writer = self.writer.as_mut().expect("not connected");
        writeln!(writer, "{message}").unwrap();
        writer.flush().unwrap();
    }

    pub fn reply_ok(&mut self, request: &Value, result: Value) {
        self.send(&json!({
            "type": "response",
            "id": request["id"],
            "status": "ok",
            "result": result,
        }));
    }

    pub fn reply_error(&mut self, request: &Value, error: &str) {
        self.send(&json!({
            "type": "response",
            "id": request["id"],
            "status": "error",
            "error": error,
        }));
    }

    pub fn send_custom_escape(&mut self, identity: &str, payload: &str) {
        self.send(&json!({
            "type": "notification",
            "notification": "custom_escape_sequence",
            "session_id": "w0t0p0",
            "sender_identity": identity,
            "payload": payload,
        }));
    }

    /// Accept the connection and answer `get_app` and `subscribe`.
    pub fn handshake(&mut self) {
        self.accept();

        let get_app = self.read_request().expect("expected get_app");
        assert_eq!(get_app["method"], "get_app");
        self.reply_ok(&get_app, json!({"name": "fake-host", "version": "0.0.1"}));

        let subscribe = self.read_request().expect("expected subscribe");
        assert_eq!(subscribe["method"], "subscribe");
        assert_eq!(subscribe["notification"], "custom_escape_sequence");
        self.reply_ok(&subscribe, Value::Null);
    }

    /// Simulate host shutdown: stop sending, the listener sees EOF.
    pub fn close(&mut self) {
        if let Some(writer) = self.writer.as_ref() {
            let _ = writer.shutdown(Shutdown::Write);
        }
    }

    /// All requests sent until the listener hung up.
    pub fn remaining_requests(&mut self) -> Vec<Value> {
        let mut requests = Vec::new();
        while let Some(request) = self.read_request() {
            requests.push(request);
        }
        requests
    }

    pub fn wait(&mut self) -> (ExitStatus, String) {
        let mut child = self.child.take().expect("already waited");
        wait_for_exit(&mut child)
    }
}

impl Drop for HostHarness {
    fn drop(&mut self) {
        if let Some(ref mut child) = self.child {
            let _ = child.kill();
        }
    }
}
