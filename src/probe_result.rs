use crate::Ttl;
use std::time::{Duration, Instant};

/// Outcome of one settled probe.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeResult {
    pub sequence_number: u16,
    pub sent_at: Instant,
    /// `None` if no reply arrived before the deadline.
    pub received_at: Option<Instant>,
    /// Round-trip time in milliseconds, never negative. `None` for a lost probe.
    pub delay_millis: Option<f64>,
    pub ttl: Option<Ttl>,
    /// Size of the reply's ICMP message.
    pub package_size: Option<usize>,
}

impl ProbeResult {
    pub(crate) fn replied(
        sequence_number: u16,
        sent_at: Instant,
        received_at: Instant,
        ttl: Ttl,
        package_size: usize,
    ) -> Self {
        let delay = received_at.saturating_duration_since(sent_at);
        ProbeResult {
            sequence_number,
            sent_at,
            received_at: Some(received_at),
            delay_millis: Some(delay.as_secs_f64() * 1000.0),
            ttl: Some(ttl),
            package_size: Some(package_size),
        }
    }

    pub(crate) fn lost(sequence_number: u16, sent_at: Instant) -> Self {
        ProbeResult {
            sequence_number,
            sent_at,
            received_at: None,
            delay_millis: None,
            ttl: None,
            package_size: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.delay_millis.is_none()
    }

    pub fn delay(&self) -> Option<Duration> {
        self.received_at.map(|received_at| received_at.saturating_duration_since(self.sent_at))
    }
}
