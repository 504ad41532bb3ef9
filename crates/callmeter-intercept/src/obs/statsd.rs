//! StatsD over UDP.
//!
//! One datagram per sample: `{prefix}{name}:{ms}|ms` for timers and
//! `{prefix}{name}:1|c` for counters. Sends are best-effort and never block on
//! the collector.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use callmeter_core::error::{CallMeterError, Result};

use super::MetricsSink;

#[derive(Debug)]
pub struct StatsdSink {
    socket: UdpSocket,
    target: SocketAddr,
    prefix: String,
}

impl StatsdSink {
    /// Resolve `addr` and bind a local socket connected to it.
    pub fn connect(addr: &str, prefix: &str) -> Result<Self> {
        let target = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| CallMeterError::Transport(format!("statsd addr resolved to nothing: {addr}")))?;

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        socket.set_nonblocking(true)?;

        tracing::info!(%target, prefix, "statsd sink connected");
        Ok(Self {
            socket,
            target,
            prefix: prefix.to_string(),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn send(&self, line: &str) -> Result<()> {
        self.socket.send(line.as_bytes())?;
        Ok(())
    }
}

impl MetricsSink for StatsdSink {
    fn timer(&self, name: &str, elapsed_ms: u64) -> Result<()> {
        self.send(&format!("{}{}:{}|ms", self.prefix, name, elapsed_ms))
    }

    fn counter(&self, name: &str) -> Result<()> {
        self.send(&format!("{}{}:1|c", self.prefix, name))
    }
}
