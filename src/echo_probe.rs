use crate::details::icmp::v4::RawSocket;
use crate::details::{PingError, PingResult, Transport};
use crate::{ProbeReport, ProbeResult, SessionConfig};
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

/// Resolves `host` to an IPv4 address.
///
/// Dotted-quad literals are taken as they are; names are handed to the platform resolver.
pub fn resolve(host: &str) -> PingResult<Ipv4Addr> {
    if let Ok(ipv4) = host.parse::<Ipv4Addr>() {
        return Ok(ipv4);
    }
    let addrs = (host, 0)
        .to_socket_addrs()
        .map_err(|e| PingError::new(format!("unknown host {host} ({e})")))?;
    let mut found_any = false;
    for addr in addrs {
        found_any = true;
        if let IpAddr::V4(ipv4) = addr.ip() {
            tracing::debug!(host, %ipv4, "resolved host");
            return Ok(ipv4);
        }
    }
    let reason = if found_any { "no IPv4 address" } else { "no address" };
    Err(PingError::new(format!("unknown host {host} ({reason})")).into())
}

/// Validates `config` and opens the raw socket for a new session.
///
/// Opening the socket needs elevated privileges. The `std::io::Error` of a failed attempt is
/// returned as is, so its kind (usually `PermissionDenied`) can be inspected by downcasting.
pub fn create(config: &SessionConfig) -> PingResult<EchoSession> {
    config.validate()?;
    let transport = Transport::open(config.identifier)?;
    Ok(EchoSession(crate::details::EchoSession::new(config.clone(), transport)))
}

/// A series of echo probes towards one destination over a dedicated raw socket.
///
/// The socket is released when the session has run or is dropped.
pub struct EchoSession(crate::details::EchoSession<RawSocket>);

impl EchoSession {
    /// Sends `packet_count` probes, reports each one as it settles and returns all results in
    /// order. Lost probes do not stop the session.
    pub fn run<R>(self, reporter: &mut R) -> Vec<ProbeResult>
    where
        R: ProbeReport + ?Sized,
    {
        self.0.run(reporter)
    }
}
