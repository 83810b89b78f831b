//! Readiness probes.
//!
//! Each probe opens a TCP connection and performs the smallest exchange the
//! server only answers positively once it is accepting sessions. No
//! credentials are sent.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::trace;

const IO_TIMEOUT: Duration = Duration::from_millis(500);

/// Protocol 3.0.
const PROTOCOL_VERSION: i32 = 196_608;

/// Upper bound on an ErrorResponse body we bother reading for logs.
const MAX_ERROR_LEN: usize = 8192;

const PING: &[u8] = b"*1\r\n$4\r\nPING\r\n";

/// A health check for one dependency.
pub trait ReadinessProbe: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// One probe attempt. Errors count as "not ready".
    fn check(&self) -> bool;
}

fn connect(host: &str, port: u16) -> Option<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().ok()?.collect();
    let stream = addrs
        .iter()
        .find_map(|addr| TcpStream::connect_timeout(addr, IO_TIMEOUT).ok())?;
    stream.set_read_timeout(Some(IO_TIMEOUT)).ok()?;
    stream.set_write_timeout(Some(IO_TIMEOUT)).ok()?;
    Some(stream)
}

/// Build a protocol 3.0 `StartupMessage` for `user`.
fn startup_message(user: &str) -> Vec<u8> {
    let mut body = PROTOCOL_VERSION.to_be_bytes().to_vec();
    for (key, value) in [("user", user), ("database", user)] {
        body.extend_from_slice(key.as_bytes());
        body.push(0);
        body.extend_from_slice(value.as_bytes());
        body.push(0);
    }
    body.push(0);

    let len = (body.len() + 4) as i32;
    let mut message = len.to_be_bytes().to_vec();
    message.extend(body);
    message
}

/// Pull the SQLSTATE (`C` field) out of an ErrorResponse body.
fn sqlstate(body: &[u8]) -> Option<String> {
    body.split(|b| *b == 0)
        .find_map(|field| field.strip_prefix(b"C"))
        .map(|code| String::from_utf8_lossy(code).into_owned())
}

/// What the server said to our startup packet.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StartupReply {
    /// An authentication request: the server will accept sessions.
    Authentication,
    /// An ErrorResponse, e.g. 57P03 while the database is starting up.
    Error(Option<String>),
    Other(u8),
}

/// Starts a session and waits for the server to ask for authentication.
///
/// During startup or crash recovery the server still accepts connections
/// but answers every startup packet with an error, so a bare connect is
/// not enough.
#[derive(Debug, Clone)]
pub struct PostgresProbe {
    host: String,
    port: u16,
    user: String,
}

impl PostgresProbe {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
        }
    }

    fn exchange(&self) -> Option<StartupReply> {
        let mut stream = connect(&self.host, self.port)?;
        stream.write_all(&startup_message(&self.user)).ok()?;

        let mut tag = [0u8; 1];
        stream.read_exact(&mut tag).ok()?;
        match tag[0] {
            b'R' => Some(StartupReply::Authentication),
            b'E' => {
                let mut len = [0u8; 4];
                stream.read_exact(&mut len).ok()?;
                let len = (i32::from_be_bytes(len) as usize).saturating_sub(4);
                let mut body = vec![0u8; len.min(MAX_ERROR_LEN)];
                let code = stream.read_exact(&mut body).ok().and_then(|_| sqlstate(&body));
                Some(StartupReply::Error(code))
            }
            other => Some(StartupReply::Other(other)),
        }
    }
}

impl ReadinessProbe for PostgresProbe {
    fn name(&self) -> &str {
        "postgres"
    }

    fn check(&self) -> bool {
        let reply = self.exchange();
        trace!("postgres probe {}:{} -> {:?}", self.host, self.port, reply);
        reply == Some(StartupReply::Authentication)
    }
}

/// Sends `PING`. An auth error still proves the server is serving.
#[derive(Debug, Clone)]
pub struct RedisProbe {
    host: String,
    port: u16,
}

impl RedisProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn exchange(&self) -> Option<String> {
        let mut stream = connect(&self.host, self.port)?;
        stream.write_all(PING).ok()?;
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).ok()?;
        Some(String::from_utf8_lossy(&buf[..n]).into_owned())
    }
}

impl ReadinessProbe for RedisProbe {
    fn name(&self) -> &str {
        "redis"
    }

    fn check(&self) -> bool {
        let reply = self.exchange();
        trace!("redis probe {}:{} -> {:?}", self.host, self.port, reply);
        reply.is_some_and(|r| r.starts_with("+PONG") || r.starts_with("-NOAUTH"))
    }
}

/// Probe backed by a closure.
pub struct FnProbe<F> {
    name: String,
    check: F,
}

impl<F> FnProbe<F>
where
    F: Fn() -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> ReadinessProbe for FnProbe<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> bool {
        (self.check)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    /// Accept one connection, read `expect` bytes, reply with `reply`.
    fn serve_once(expect: usize, reply: &'static [u8]) -> (u16, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut received = vec![0u8; expect];
            conn.read_exact(&mut received).unwrap();
            conn.write_all(reply).unwrap();
            received
        });
        (port, handle)
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    /// `AuthenticationSASL` offering SCRAM-SHA-256.
    const AUTH_SASL: &[u8] = b"R\0\0\0\x17\0\0\0\x0aSCRAM-SHA-256\0\0";

    /// `ErrorResponse` with SQLSTATE 57P03.
    const STARTING_UP: &[u8] =
        b"E\0\0\0\x37SFATAL\0C57P03\0Mthe database system is starting up\0\0";

    #[test]
    fn startup_message_layout() {
        let message = startup_message("postgres");
        let len = i32::from_be_bytes(message[..4].try_into().unwrap()) as usize;
        assert_eq!(len, message.len());
        assert_eq!(&message[4..8], &PROTOCOL_VERSION.to_be_bytes());
        assert_eq!(&message[8..], b"user\0postgres\0database\0postgres\0\0");
    }

    #[test]
    fn postgres_probe_accepts_authentication_request() {
        let expected = startup_message("postgres");
        let (port, server) = serve_once(expected.len(), AUTH_SASL);
        assert!(PostgresProbe::new("127.0.0.1", port, "postgres").check());
        assert_eq!(server.join().unwrap(), expected);
    }

    #[test]
    fn postgres_probe_rejects_server_still_starting() {
        let expected = startup_message("postgres");
        let (port, server) = serve_once(expected.len(), STARTING_UP);
        let probe = PostgresProbe::new("127.0.0.1", port, "postgres");
        assert_eq!(
            probe.exchange(),
            Some(StartupReply::Error(Some("57P03".to_string())))
        );
        server.join().unwrap();
    }

    #[test]
    fn postgres_probe_rejects_ssl_style_reply() {
        let (port, server) = serve_once(startup_message("postgres").len(), b"N");
        assert!(!PostgresProbe::new("127.0.0.1", port, "postgres").check());
        server.join().unwrap();
    }

    #[test]
    fn sqlstate_reads_code_field() {
        assert_eq!(sqlstate(b"SFATAL\0C28P01\0Mbad\0\0").as_deref(), Some("28P01"));
        assert_eq!(sqlstate(b"SFATAL\0Mbad\0\0"), None);
    }

    #[test]
    fn redis_probe_accepts_pong() {
        let (port, server) = serve_once(PING.len(), b"+PONG\r\n");
        assert!(RedisProbe::new("127.0.0.1", port).check());
        assert_eq!(server.join().unwrap(), PING.to_vec());
    }

    #[test]
    fn redis_probe_accepts_noauth() {
        let (port, server) = serve_once(PING.len(), b"-NOAUTH Authentication required.\r\n");
        assert!(RedisProbe::new("127.0.0.1", port).check());
        server.join().unwrap();
    }

    #[test]
    fn probes_fail_when_nothing_listens() {
        let port = closed_port();
        assert!(!PostgresProbe::new("127.0.0.1", port, "postgres").check());
        assert!(!RedisProbe::new("127.0.0.1", port).check());
    }

    #[test]
    fn fn_probe_calls_closure() {
        let calls = AtomicU32::new(0);
        let probe = FnProbe::new("test", || calls.fetch_add(1, Ordering::SeqCst) >= 1);
        assert_eq!(probe.name(), "test");
        assert!(!probe.check());
        assert!(probe.check());
    }
}
