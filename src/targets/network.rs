//! Network target for remote logging
//!
//! Sends one newline-terminated formatted entry per line over TCP, or one
//! datagram per entry over UDP.

use super::worker::{Sink, Worker, DEFAULT_QUEUE_CAPACITY};
use crate::core::{Entry, ErrorWriter, Filter, LoggerError, Record, Result, Target};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Tcp,
    Udp,
}

/// Network target that sends logs to a remote server
///
/// # Example
///
/// ```no_run
/// use rust_log_dispatcher::prelude::*;
/// use rust_log_dispatcher::targets::NetworkTarget;
///
/// let logger = Logger::new();
/// logger.add_target(NetworkTarget::new("127.0.0.1:5140"));
/// logger.open().expect("log server reachable");
/// logger.info("This log will be sent to 127.0.0.1:5140");
/// logger.close();
/// ```
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkTarget {
    pub network: Transport,
    pub address: String,
    pub filter: Filter,
    /// Keep one connection for the whole session instead of connecting per entry
    pub persistent: bool,
    /// Reconnect and resend once when a persistent connection breaks
    pub reconnect: bool,
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub queue_capacity: usize,
    #[serde(skip)]
    worker: Option<Worker>,
}

impl Default for NetworkTarget {
    fn default() -> Self {
        Self {
            network: Transport::Tcp,
            address: String::new(),
            filter: Filter::default(),
            persistent: true,
            reconnect: true,
            connect_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker: None,
        }
    }
}

impl NetworkTarget {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_transport(mut self, network: Transport) -> Self {
        self.network = network;
        self
    }

    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Enable or disable automatic reconnection on errors
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect = enable;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

impl Target for NetworkTarget {
    fn name(&self) -> &str {
        "network"
    }

    fn open(&mut self, errors: ErrorWriter) -> Result<()> {
        if self.address.is_empty() {
            return Err(LoggerError::config("NetworkTarget", "address must be set"));
        }

        let mut sink = NetworkSink {
            network: self.network,
            address: self.address.clone(),
            persistent: self.persistent,
            reconnect: self.reconnect,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            connection: None,
        };
        if self.persistent {
            sink.connection = Some(sink.connect().map_err(|e| {
                LoggerError::target_open("network", format!("{} ({})", e, self.address))
            })?);
        }

        self.worker = Some(Worker::spawn("network", self.queue_capacity, sink, errors)?);
        Ok(())
    }

    fn process(&mut self, record: Record) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        match record {
            Record::Entry(entry) => {
                if self.filter.allows(&entry) {
                    worker.submit(entry);
                }
            }
            Record::Flush => worker.drain(),
        }
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.join();
        }
    }
}

enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

impl Connection {
    fn send(&mut self, payload: &[u8]) -> std::io::Result<()> {
        match self {
            Connection::Tcp(stream) => stream.write_all(payload),
            Connection::Udp(socket) => socket.send(payload).map(|_| ()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Connection::Tcp(stream) => stream.flush(),
            Connection::Udp(_) => Ok(()),
        }
    }
}

struct NetworkSink {
    network: Transport,
    address: String,
    persistent: bool,
    reconnect: bool,
    connect_timeout: Duration,
    write_timeout: Duration,
    connection: Option<Connection>,
}

impl NetworkSink {
    fn connect(&self) -> Result<Connection> {
        let addr = self
            .address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| LoggerError::config("NetworkTarget", "address did not resolve"))?;

        match self.network {
            Transport::Tcp => {
                let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
                // Set timeouts to prevent hanging
                stream.set_write_timeout(Some(self.write_timeout))?;
                // Enable TCP_NODELAY for low-latency logging
                stream.set_nodelay(true)?;
                Ok(Connection::Tcp(stream))
            }
            Transport::Udp => {
                let bind = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(bind)?;
                socket.connect(addr)?;
                socket.set_write_timeout(Some(self.write_timeout))?;
                Ok(Connection::Udp(socket))
            }
        }
    }

    fn send_once(&mut self, payload: &[u8]) -> Result<()> {
        let mut connection = self.connect()?;
        connection.send(payload)?;
        connection.flush()?;
        Ok(())
    }
}

impl Sink for NetworkSink {
    fn write(&mut self, entry: &Entry) -> Result<()> {
        let mut payload = entry.output().to_string();
        payload.push('\n');

        if !self.persistent {
            return self.send_once(payload.as_bytes());
        }

        let result = match self.connection {
            Some(ref mut connection) => connection.send(payload.as_bytes()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "network connection not established",
            )),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.connection = None;
                if !self.reconnect {
                    return Err(e.into());
                }
                match self.connect() {
                    Ok(mut connection) => {
                        connection.send(payload.as_bytes())?;
                        self.connection = Some(connection);
                        Ok(())
                    }
                    Err(reconnect_err) => Err(LoggerError::writer(format!(
                        "Failed to send log and reconnect: {} (reconnect: {})",
                        e, reconnect_err
                    ))),
                }
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            connection.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{stderr_writer, Level};
    use std::io::{BufRead, BufReader};
    use std::net::{TcpListener, UdpSocket};
    use std::sync::Arc;
    use std::thread;

    fn record(message: &str) -> Record {
        let mut entry = Entry::new(Level::Warning, "net", message);
        entry.formatted = format!("[Warning][net] {}", message);
        Record::Entry(Arc::new(entry))
    }

    #[test]
    fn test_tcp_delivers_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            BufReader::new(stream)
                .lines()
                .map(|l| l.unwrap())
                .collect::<Vec<_>>()
        });

        let mut target = NetworkTarget::new(address);
        target.open(stderr_writer()).unwrap();
        target.process(record("one"));
        target.process(record("two"));
        target.process(Record::Flush);
        target.close();

        let lines = server.join().unwrap();
        assert_eq!(lines, ["[Warning][net] one", "[Warning][net] two"]);
    }

    #[test]
    fn test_udp_delivers_datagrams() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let address = server.local_addr().unwrap().to_string();

        let mut target = NetworkTarget::new(address).with_transport(Transport::Udp);
        target.open(stderr_writer()).unwrap();
        target.process(record("datagram"));
        target.process(Record::Flush);
        target.close();

        let mut buf = [0u8; 256];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"[Warning][net] datagram\n");
    }

    #[test]
    fn test_open_fails_without_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut target = NetworkTarget::new(address);
        assert!(target.open(stderr_writer()).is_err());
    }

    #[test]
    fn test_open_requires_address() {
        let mut target = NetworkTarget::default();
        let err = target.open(stderr_writer()).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_config_transport_names() {
        let target: NetworkTarget =
            serde_json::from_str(r#"{"network":"udp","address":"127.0.0.1:9"}"#).unwrap();
        assert_eq!(target.network, Transport::Udp);
        assert!(target.persistent);
    }
}
