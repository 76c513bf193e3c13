use crate::details::icmp::v4::icmpv4::{ICMP_HEADER_SIZE, IPV4_HEADER_SIZE};
use crate::details::PingError;
use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_PACKET_COUNT: u16 = 4;
pub const DEFAULT_PACKET_SIZE: usize = 64;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Largest ICMP message an IPv4 datagram without options can carry.
pub const MAX_PACKET_SIZE: usize = u16::MAX as usize - IPV4_HEADER_SIZE;

/// How an echo reply is matched to the outstanding probe.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SequenceMatching {
    /// Any echo reply carrying the session identifier settles the outstanding probe, including
    /// a late reply to an earlier probe.
    #[default]
    IdentifierOnly,
    /// The sequence number must match the outstanding probe as well.
    IdentifierAndSequence,
}

/// Everything an echo session needs, fixed at construction.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub destination_host: String,
    pub destination_address: Ipv4Addr,
    pub packet_count: u16,
    /// Size of the ICMP message, 8 header bytes included.
    pub packet_size: usize,
    pub identifier: u16,
    pub timeout: Duration,
    pub probe_interval: Duration,
    pub sequence_matching: SequenceMatching,
}

impl SessionConfig {
    pub fn new(destination_host: impl Into<String>, destination_address: Ipv4Addr) -> Self {
        SessionConfig {
            destination_host: destination_host.into(),
            destination_address,
            packet_count: DEFAULT_PACKET_COUNT,
            packet_size: DEFAULT_PACKET_SIZE,
            identifier: process_identifier(),
            timeout: DEFAULT_TIMEOUT,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            sequence_matching: SequenceMatching::default(),
        }
    }

    pub fn payload_size(&self) -> usize {
        self.packet_size.saturating_sub(ICMP_HEADER_SIZE)
    }

    pub fn validate(&self) -> Result<(), PingError> {
        if self.packet_count == 0 {
            return Err(PingError::new("packet count must be positive"));
        }
        if self.packet_size < ICMP_HEADER_SIZE {
            return Err(PingError::new(format!(
                "packet size {} is smaller than the {ICMP_HEADER_SIZE} byte ICMP header",
                self.packet_size
            )));
        }
        if self.packet_size > MAX_PACKET_SIZE {
            return Err(PingError::new(format!(
                "packet size {} exceeds the maximum of {MAX_PACKET_SIZE} bytes",
                self.packet_size
            )));
        }
        if self.timeout.is_zero() {
            return Err(PingError::new("timeout must be positive"));
        }
        if self.probe_interval.is_zero() {
            return Err(PingError::new("probe interval must be positive"));
        }
        Ok(())
    }
}

/// The process id masked to 16 bits.
pub fn process_identifier() -> u16 {
    #[allow(clippy::cast_possible_truncation)]
    let identifier = (std::process::id() & 0xFFFF) as u16;
    identifier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new("localhost", Ipv4Addr::LOCALHOST)
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!("localhost", config.destination_host);
        assert_eq!(4, config.packet_count);
        assert_eq!(64, config.packet_size);
        assert_eq!(56, config.payload_size());
        assert_eq!(Duration::from_secs(3), config.timeout);
        assert_eq!(Duration::from_secs(1), config.probe_interval);
        assert_eq!(SequenceMatching::IdentifierOnly, config.sequence_matching);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn identifier_is_masked_process_id() {
        assert_eq!(std::process::id() & 0xFFFF, u32::from(config().identifier));
        assert_eq!(process_identifier(), process_identifier());
    }

    #[test]
    fn header_only_packet_is_valid() {
        let config = SessionConfig { packet_size: 8, ..config() };
        assert!(config.validate().is_ok());
        assert_eq!(0, config.payload_size());
    }

    #[test]
    fn packet_smaller_than_header_is_rejected() {
        let config = SessionConfig { packet_size: 7, ..config() };
        let error = config.validate().unwrap_err();
        assert_eq!("PingError: packet size 7 is smaller than the 8 byte ICMP header", format!("{error}"));
    }

    #[test]
    fn oversized_packet_is_rejected() {
        assert!(SessionConfig { packet_size: MAX_PACKET_SIZE, ..config() }.validate().is_ok());
        assert!(SessionConfig { packet_size: MAX_PACKET_SIZE + 1, ..config() }.validate().is_err());
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(SessionConfig { packet_count: 0, ..config() }.validate().is_err());
        assert!(SessionConfig { timeout: Duration::ZERO, ..config() }.validate().is_err());
        assert!(SessionConfig { probe_interval: Duration::ZERO, ..config() }.validate().is_err());
    }
}
