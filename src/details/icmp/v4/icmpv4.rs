use crate::details::icmp::v4::{checksum, SequenceNumber, Ttl};
use crate::details::PingError;
use pnet_packet::icmp::{
    echo_reply::EchoReplyPacket,
    echo_request::{EchoRequestPacket as EchoRequestPacketV4, MutableEchoRequestPacket as MutableEchoRequestPacketV4},
    IcmpCode, IcmpTypes,
};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::Packet;
use std::time::Instant;

pub(crate) const ICMP_HEADER_SIZE: usize = 8;
pub(crate) const IPV4_HEADER_SIZE: usize = 20;

const PAYLOAD_PATTERN_START: u8 = 0x42;

pub(crate) struct EchoRequest {
    pub identifier: u16,
    pub sequence_number: SequenceNumber,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EchoReply {
    pub identifier: u16,
    pub sequence_number: SequenceNumber,
    pub ttl: Ttl,
    pub package_size: usize,
    pub received_at: Instant,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EchoReceive {
    Reply(EchoReply),
    Timeout,
}

/// Payload bytes counting up from 0x42, wrapping at 256.
pub(crate) fn payload(size: usize) -> Vec<u8> {
    let mut value = PAYLOAD_PATTERN_START;
    (0..size)
        .map(|_| {
            let byte = value;
            value = value.wrapping_add(1);
            byte
        })
        .collect()
}

impl EchoRequest {
    pub(crate) fn new(identifier: u16, sequence_number: SequenceNumber, payload_size: usize) -> Self {
        EchoRequest { identifier, sequence_number, payload: payload(payload_size) }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, PingError> {
        let buf = vec![0u8; EchoRequestPacketV4::minimum_packet_size() + self.payload.len()];
        let mut package = MutableEchoRequestPacketV4::owned(buf)
            .ok_or_else(|| PingError::new("could not create ICMP package"))?;
        package.set_icmp_type(IcmpTypes::EchoRequest);
        package.set_icmp_code(IcmpCode::new(0));
        package.set_identifier(self.identifier);
        package.set_sequence_number(self.sequence_number.into());
        package.set_payload(&self.payload);

        package.set_checksum(0_u16);
        let checksum = checksum(package.packet());
        package.set_checksum(checksum);
        Ok(package.packet().to_vec())
    }
}

/// Builds the wire bytes of an echo request carrying `payload_size` pattern bytes.
pub(crate) fn encode(
    identifier: u16,
    sequence_number: SequenceNumber,
    payload_size: usize,
) -> Result<Vec<u8>, PingError> {
    EchoRequest::new(identifier, sequence_number, payload_size).encode()
}

/// Parses a datagram read from a raw ICMP socket, IPv4 header included.
///
/// Only a well-formed echo reply with a valid checksum is returned. Anything else that shows up
/// on the socket (our own requests on loopback, other ICMP messages, truncated or corrupted data)
/// yields `None`.
pub(crate) fn decode(datagram: &[u8], received_at: Instant) -> Option<EchoReply> {
    let ipv4_packet = Ipv4Packet::new(datagram)?;
    if ipv4_packet.get_version() != 4 {
        return None;
    }
    // Usually 20 bytes, longer when options are present.
    let header_size = usize::from(ipv4_packet.get_header_length()) * 4;
    if header_size < IPV4_HEADER_SIZE || datagram.len() < header_size + ICMP_HEADER_SIZE {
        return None;
    }

    let icmp_bytes = &datagram[header_size..];
    let echo_reply_package = EchoReplyPacket::new(icmp_bytes)?;
    if echo_reply_package.get_icmp_type() != IcmpTypes::EchoReply
        || echo_reply_package.get_icmp_code() != IcmpCode::new(0)
    {
        tracing::trace!(icmp_type = echo_reply_package.get_icmp_type().0, "ignoring ICMP message");
        return None;
    }
    if checksum(icmp_bytes) != 0 {
        tracing::trace!("ignoring echo reply with bad checksum");
        return None;
    }

    Some(EchoReply {
        identifier: echo_reply_package.get_identifier(),
        sequence_number: echo_reply_package.get_sequence_number().into(),
        ttl: ipv4_packet.get_ttl().into(),
        package_size: icmp_bytes.len(),
        received_at,
    })
}
