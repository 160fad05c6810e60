//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use reactor_http::{Host, HttpHandler, Server, ServerConfig};

/// Loopback, ephemeral port, small pools, short drain.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::with_port(0);
    config.listener.host = Host::new("127.0.0.1").unwrap();
    config.event_loops.io_threads = 2;
    config.timeouts.drain_secs = 2;
    config
}

/// Start a server for `handler` with [`test_config`].
pub fn start_server<H: HttpHandler + 'static>(handler: H) -> (Server, SocketAddr) {
    start_server_with(test_config(), handler)
}

pub fn start_server_with<H: HttpHandler + 'static>(
    config: ServerConfig,
    handler: H,
) -> (Server, SocketAddr) {
    let server = Server::new(config, handler);
    let addr = server
        .start()
        .expect("server should start")
        .local_addr()
        .expect("started server has an address");
    (server, addr)
}

/// A blocking client connection with a read timeout, so a hung server fails
/// the test instead of stalling it.
pub struct RawClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl RawClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self {
            writer: stream,
            reader,
        }
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).unwrap();
        self.writer.flush().unwrap();
    }

    /// Read one response, including its body unless it is interim.
    pub fn read_response(&mut self) -> RawResponse {
        let mut response = self.read_head().unwrap();
        if response.status >= 200 {
            let length = response.content_length().unwrap_or(0);
            let mut body = vec![0u8; length];
            self.reader.read_exact(&mut body).unwrap();
            response.body = body;
        }
        response
    }

    /// Read one response to a HEAD request: a header block and no payload.
    pub fn read_head_response(&mut self) -> RawResponse {
        self.read_head().unwrap()
    }

    /// True once the server has closed the connection.
    pub fn is_closed(&mut self) -> bool {
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte) {
            Ok(0) => true,
            Ok(_) => false,
            Err(error) => error.kind() == io::ErrorKind::ConnectionReset,
        }
    }

    fn read_head(&mut self) -> io::Result<RawResponse> {
        let mut status_line = String::new();
        if self.reader.read_line(&mut status_line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"));
        }
        let mut parts = status_line.trim_end().splitn(3, ' ');
        let version = parts.next().unwrap_or_default().to_string();
        let status = parts
            .next()
            .and_then(|code| code.parse().ok())
            .unwrap_or_default();
        let reason = parts.next().unwrap_or_default().to_string();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            self.reader.read_line(&mut line)?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        Ok(RawResponse {
            version,
            status,
            reason,
            headers,
            body: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct RawResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length")?.parse().ok()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
