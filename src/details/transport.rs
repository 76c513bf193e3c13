use crate::details::icmp::v4::icmpv4::decode;
use crate::details::icmp::v4::{EchoReceive, RawSocket, TSocket};
use crate::details::{PingError, PingResult};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;

// Large enough for any IPv4 datagram.
const RECEIVE_BUFFER_SIZE: usize = 65_536;

/// Exclusive owner of the session's ICMP socket.
///
/// A transport is either open (it holds a socket) or closed. Closing drops the socket and
/// thereby releases the descriptor; it happens at the latest when the transport is dropped.
pub(crate) struct Transport<S> {
    socket: Option<S>,
    identifier: u16,
    buf: Vec<u8>,
}

impl Transport<RawSocket> {
    pub(crate) fn open(identifier: u16) -> PingResult<Self> {
        let socket = RawSocket::new().map_err(|e| {
            tracing::error!("could not open raw ICMP socket: {}", e);
            e
        })?;
        tracing::debug!(identifier, "transport opened");
        Ok(Self::with_socket(socket, identifier))
    }
}

impl<S> Transport<S> {
    pub(crate) fn with_socket(socket: S, identifier: u16) -> Self {
        Transport { socket: Some(socket), identifier, buf: vec![0u8; RECEIVE_BUFFER_SIZE] }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    pub(crate) fn close(&mut self) {
        if self.socket.take().is_some() {
            tracing::debug!(identifier = self.identifier, "transport closed");
        }
    }

    fn socket(&self) -> Result<&S, PingError> {
        self.socket.as_ref().ok_or_else(|| PingError::new("transport is closed"))
    }
}

impl<S> Transport<S>
where
    S: TSocket,
{
    /// Sends one packet and returns the time it left.
    pub(crate) fn send(&self, packet: &[u8], destination: Ipv4Addr) -> PingResult<Instant> {
        let socket = self.socket()?;
        // The port is meaningless for ICMP.
        let addr: socket2::SockAddr = SocketAddr::new(IpAddr::V4(destination), 0).into();
        let sent_at = Instant::now();
        let n = socket.send_to(packet, &addr)?;
        if n != packet.len() {
            return Err(PingError::new(format!("sent {n} of {} bytes", packet.len())).into());
        }
        tracing::trace!(%destination, size = n, "echo request sent");
        Ok(sent_at)
    }

    /// Waits for an echo reply carrying this transport's identifier until `deadline`.
    ///
    /// Each unrelated datagram re-arms the wait with whatever is left of the budget, so foreign
    /// traffic never pushes the return past the deadline.
    pub(crate) fn receive_until(&mut self, deadline: Instant) -> PingResult<EchoReceive> {
        let Transport { socket, identifier, buf } = self;
        let socket = socket.as_ref().ok_or_else(|| PingError::new("transport is closed"))?;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(EchoReceive::Timeout);
            }

            let (n, source) = match socket.recv_from(buf, remaining) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    return Ok(EchoReceive::Timeout);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let received_at = Instant::now();

            match decode(&buf[..n], received_at) {
                None => {
                    tracing::trace!(%source, size = n, "discarding datagram");
                }
                Some(reply) if reply.identifier != *identifier => {
                    tracing::trace!(%source, identifier = reply.identifier, "discarding foreign echo reply");
                }
                Some(reply) => {
                    tracing::trace!(%source, sequence_number = %reply.sequence_number, "echo reply received");
                    return Ok(EchoReceive::Reply(reply));
                }
            }
        }
    }
}

impl<S> Drop for Transport<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::icmp::v4::icmpv4::encode;
    use crate::details::icmp::v4::tests::{OnReceive, OnSend, SocketMock};
    use crate::details::icmp::v4::SequenceNumber;
    use more_asserts as ma;
    use std::time::Duration;

    const IDENTIFIER: u16 = 0x1234;

    fn localhost() -> Ipv4Addr {
        Ipv4Addr::new(127, 0, 0, 1)
    }

    fn transport(on_send: OnSend, on_receive: OnReceive) -> (Transport<SocketMock>, SocketMock) {
        let socket = SocketMock::new(on_send, on_receive);
        (Transport::with_socket(socket.clone(), IDENTIFIER), socket)
    }

    #[test]
    fn send_reaches_destination() {
        let (transport, socket) = transport(OnSend::ReturnDefault, OnReceive::Silence);
        let packet = encode(IDENTIFIER, SequenceNumber::start_value(), 56).unwrap();

        let before = Instant::now();
        let sent_at = transport.send(&packet, localhost()).unwrap();

        ma::assert_ge!(sent_at, before);
        socket
            .should_send_number_of_messages(1)
            .should_send_to_address(&IpAddr::V4(localhost()));
        assert_eq!(vec![packet], socket.sent_packets());
    }

    #[test]
    fn send_failure_is_reported() {
        let (transport, socket) = transport(OnSend::ReturnErr, OnReceive::Silence);
        let packet = encode(IDENTIFIER, SequenceNumber::start_value(), 56).unwrap();

        assert!(transport.send(&packet, localhost()).is_err());
        socket.should_send_number_of_messages(0);
    }

    #[test]
    fn short_write_is_reported() {
        let (transport, socket) = transport(OnSend::ReturnShortWrite, OnReceive::Silence);
        let packet = encode(IDENTIFIER, SequenceNumber::start_value(), 56).unwrap();

        let error = transport.send(&packet, localhost()).unwrap_err();

        assert_eq!("PingError: sent 63 of 64 bytes", format!("{error}"));
        assert!(error.downcast_ref::<PingError>().is_some());
        socket.should_send_number_of_messages(1);
    }

    #[test]
    fn receive_matching_reply() {
        let (mut transport, socket) = transport(OnSend::ReturnDefault, OnReceive::EchoAfter(Duration::from_millis(5)));
        let packet = encode(IDENTIFIER, SequenceNumber::from(7), 56).unwrap();
        let sent_at = transport.send(&packet, localhost()).unwrap();

        let received = transport.receive_until(sent_at + Duration::from_secs(1)).unwrap();

        let EchoReceive::Reply(reply) = received else {
            panic!("expected an echo reply");
        };
        assert_eq!(IDENTIFIER, reply.identifier);
        assert_eq!(SequenceNumber::from(7), reply.sequence_number);
        ma::assert_ge!(reply.received_at, sent_at);
        socket.should_receive_number_of_messages(1);
    }

    #[test]
    fn own_request_is_skipped() {
        let (mut transport, socket) =
            transport(OnSend::ReturnDefault, OnReceive::OwnRequestThenEcho(Duration::from_millis(5)));
        let packet = encode(IDENTIFIER, SequenceNumber::from(1), 56).unwrap();
        let sent_at = transport.send(&packet, localhost()).unwrap();

        let received = transport.receive_until(sent_at + Duration::from_secs(1)).unwrap();

        assert!(matches!(received, EchoReceive::Reply(_)));
        socket.should_receive_number_of_messages(2);
    }

    #[test]
    fn silence_times_out_at_deadline() {
        let (mut transport, _socket) = transport(OnSend::ReturnDefault, OnReceive::Silence);
        let timeout = Duration::from_millis(100);
        let start = Instant::now();

        let received = transport.receive_until(start + timeout).unwrap();

        assert_eq!(EchoReceive::Timeout, received);
        ma::assert_ge!(start.elapsed(), timeout);
        ma::assert_lt!(start.elapsed(), timeout + Duration::from_millis(80));
    }

    #[test]
    fn foreign_traffic_does_not_extend_deadline() {
        let (mut transport, socket) =
            transport(OnSend::ReturnDefault, OnReceive::ForeignTrafficEvery(Duration::from_millis(10)));
        let timeout = Duration::from_millis(150);
        let start = Instant::now();

        let received = transport.receive_until(start + timeout).unwrap();

        assert_eq!(EchoReceive::Timeout, received);
        ma::assert_lt!(start.elapsed(), timeout + Duration::from_millis(80));
        // Several foreign replies were read and thrown away on the way.
        ma::assert_ge!(socket.received_count(), 3);
    }

    #[test]
    fn deadline_in_the_past_times_out_immediately() {
        let (mut transport, socket) = transport(OnSend::ReturnDefault, OnReceive::Silence);
        let start = Instant::now();

        let received = transport.receive_until(start).unwrap();

        assert_eq!(EchoReceive::Timeout, received);
        ma::assert_lt!(start.elapsed(), Duration::from_millis(20));
        socket.should_receive_number_of_messages(0);
    }

    #[test]
    fn receive_failure_is_reported() {
        let (mut transport, _socket) = transport(OnSend::ReturnDefault, OnReceive::ReturnErr);
        assert!(transport.receive_until(Instant::now() + Duration::from_millis(50)).is_err());
    }

    #[test]
    fn close_is_idempotent() {
        let (mut transport, _socket) = transport(OnSend::ReturnDefault, OnReceive::Silence);
        assert!(transport.is_open());

        transport.close();
        assert!(!transport.is_open());
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn closed_transport_refuses_io() {
        let (mut transport, socket) = transport(OnSend::ReturnDefault, OnReceive::EchoAfter(Duration::ZERO));
        transport.close();
        let packet = encode(IDENTIFIER, SequenceNumber::start_value(), 56).unwrap();

        assert!(transport.send(&packet, localhost()).is_err());
        assert!(transport.receive_until(Instant::now() + Duration::from_millis(50)).is_err());
        socket.should_send_number_of_messages(0);
    }
}
