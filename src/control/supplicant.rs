//! `wpa_supplicant` process driven over its control socket.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::{ControlChannel, TraceRead, TraceSource};
use crate::error::ControlError;

const CONTROL_DIR: &str = "ctrl";
const CONFIG_FILE: &str = "wpa_supplicant.conf";
const REPLY_SOCKET: &str = "reply.sock";
const MAX_REPLY: usize = 4096;

/// A running supplicant with its control socket and trace stream.
///
/// Owns the temp directory, the generated config, the reply socket and
/// the child process. Dropping it kills the child and removes the
/// directory.
pub struct Supplicant {
    interface: String,
    child: Child,
    ctrl_path: PathBuf,
    socket: UnixDatagram,
    lines: Receiver<String>,
    timeout: Duration,
    workdir: TempDir,
}

impl Supplicant {
    /// Spawn `binary` on `interface` and wait for its control socket.
    ///
    /// `timeout` bounds the start-up wait and every control reply.
    pub fn start(binary: &str, interface: &str, timeout: Duration) -> Result<Self, ControlError> {
        let workdir = TempDir::new()?;
        let ctrl_dir = workdir.path().join(CONTROL_DIR);
        let conf_path = workdir.path().join(CONFIG_FILE);
        fs::write(
            &conf_path,
            format!(
                "ctrl_interface={}\nctrl_interface_group=root\nupdate_config=1\n",
                ctrl_dir.display()
            ),
        )?;

        let socket = create_reply_socket(&workdir.path().join(REPLY_SOCKET), timeout)?;

        info!("Running {} on {}", binary, interface);
        let mut child = Command::new(binary)
            .arg("-K")
            .arg("-d")
            .arg("-Dnl80211,wext,hostapd,wired")
            .arg(format!("-i{}", interface))
            .arg(format!("-c{}", conf_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ControlError::Startup(format!("{}: {}", binary, e)))?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, tx);
        }

        let mut supplicant = Self {
            interface: interface.to_string(),
            child,
            ctrl_path: ctrl_dir.join(interface),
            socket,
            lines: rx,
            timeout,
            workdir,
        };
        supplicant.wait_for_control_socket()?;
        Ok(supplicant)
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    fn wait_for_control_socket(&mut self) -> Result<(), ControlError> {
        let started = Instant::now();
        while !self.ctrl_path.exists() {
            if let Some(status) = self.child.try_wait()? {
                return Err(ControlError::Startup(format!(
                    "supplicant exited during start-up ({})",
                    status
                )));
            }
            if started.elapsed() > self.timeout {
                return Err(ControlError::Timeout(self.timeout));
            }
            thread::sleep(Duration::from_millis(100));
        }
        debug!("Control socket ready at {}", self.ctrl_path.display());
        Ok(())
    }

    /// Drop replies to earlier fire-and-forget commands.
    fn discard_stale_replies(&self) -> io::Result<()> {
        let mut buf = [0u8; MAX_REPLY];
        self.socket.set_nonblocking(true)?;
        loop {
            match self.socket.recv(&mut buf) {
                Ok(n) => debug!(
                    "Discarded stale reply: {}",
                    String::from_utf8_lossy(&buf[..n]).trim_end()
                ),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.socket.set_nonblocking(false)?;
                    return Err(e);
                }
            }
        }
        self.socket.set_nonblocking(false)
    }
}

impl ControlChannel for Supplicant {
    fn request(&mut self, command: &str) -> Result<String, ControlError> {
        self.discard_stale_replies()?;
        debug!("ctrl> {}", command);
        self.socket.send_to(command.as_bytes(), &self.ctrl_path)?;

        let mut buf = [0u8; MAX_REPLY];
        match self.socket.recv(&mut buf) {
            Ok(n) => {
                let reply = String::from_utf8_lossy(&buf[..n]).trim_end().to_string();
                debug!("ctrl< {}", reply);
                Ok(reply)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Err(ControlError::Timeout(self.timeout))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn send(&mut self, command: &str) -> Result<(), ControlError> {
        debug!("ctrl> {}", command);
        self.socket.send_to(command.as_bytes(), &self.ctrl_path)?;
        Ok(())
    }
}

impl TraceSource for Supplicant {
    fn next_line(&mut self, wait: Duration) -> TraceRead {
        match self.lines.recv_timeout(wait) {
            Ok(line) => TraceRead::Line(line),
            Err(RecvTimeoutError::Timeout) => TraceRead::Pending,
            Err(RecvTimeoutError::Disconnected) => TraceRead::Closed,
        }
    }

    fn drain(&mut self) {
        let stale = self.lines.try_iter().count();
        if stale > 0 {
            debug!("Drained {} stale trace lines", stale);
        }
    }
}

impl Drop for Supplicant {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            if e.kind() != io::ErrorKind::InvalidInput {
                warn!("Failed to stop supplicant: {}", e);
            }
        }
        let _ = self.child.wait();
        debug!("Supplicant stopped, removing {}", self.workdir.path().display());
    }
}

fn create_reply_socket(path: &Path, timeout: Duration) -> Result<UnixDatagram, ControlError> {
    use socket2::{Domain, SockAddr, Socket, Type};

    let socket = Socket::new(Domain::UNIX, Type::DGRAM, None)?;
    socket.bind(&SockAddr::unix(path)?)?;
    socket.set_read_timeout(Some(timeout))?;
    Ok(UnixDatagram::from(OwnedFd::from(socket)))
}

fn spawn_reader<R: Read + Send + 'static>(source: R, tx: Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_splits_lines() {
        let (tx, rx) = mpsc::channel();
        spawn_reader(Cursor::new(b"one\r\ntwo\nthree".to_vec()), tx);
        let lines: Vec<String> = rx.iter().collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_reader_is_lossy() {
        let (tx, rx) = mpsc::channel();
        spawn_reader(Cursor::new(vec![b'a', 0xff, b'\n']), tx);
        assert_eq!(rx.recv().unwrap(), "a\u{FFFD}");
    }

    #[test]
    fn test_reply_socket_times_out() {
        let dir = TempDir::new().unwrap();
        let socket =
            create_reply_socket(&dir.path().join("r.sock"), Duration::from_millis(50)).unwrap();
        let mut buf = [0u8; 16];
        let err = socket.recv(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
    }

    #[test]
    fn test_missing_binary_is_startup_error() {
        let err = Supplicant::start(
            "/nonexistent/wpa_supplicant",
            "wlan0",
            Duration::from_millis(100),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ControlError::Startup(_)));
    }
}
