use crate::details::icmp::v4::icmpv4::encode;
use crate::details::icmp::v4::{EchoReceive, EchoReply, SequenceNumber, TSocket};
use crate::details::transport::Transport;
use crate::details::PingResult;
use crate::{ProbeReport, ProbeResult, SequenceMatching, SessionConfig};
use std::time::{Duration, Instant};

/// Time to wait before the next probe so that probes start one interval apart. A lost probe
/// counts as zero delay and waits the full interval.
pub(crate) fn pacing_delay(probe_interval: Duration, observed_delay: Option<Duration>) -> Duration {
    probe_interval.saturating_sub(observed_delay.unwrap_or(Duration::ZERO))
}

/// `sent_at + timeout`, or the latest representable instant before it if the sum overflows.
pub(crate) fn reply_deadline(sent_at: Instant, timeout: Duration) -> Instant {
    let mut budget = timeout;
    loop {
        if let Some(deadline) = sent_at.checked_add(budget) {
            return deadline;
        }
        budget /= 2;
    }
}

pub(crate) struct EchoSession<S> {
    config: SessionConfig,
    transport: Transport<S>,
    sequence_number: SequenceNumber,
}

impl<S> EchoSession<S>
where
    S: TSocket,
{
    pub(crate) fn new(config: SessionConfig, transport: Transport<S>) -> Self {
        EchoSession { config, transport, sequence_number: SequenceNumber::start_value() }
    }

    /// Runs `packet_count` probes one after the other and closes the transport.
    pub(crate) fn run<R>(mut self, reporter: &mut R) -> Vec<ProbeResult>
    where
        R: ProbeReport + ?Sized,
    {
        let packet_count = self.config.packet_count;
        tracing::info!(
            host = %self.config.destination_host,
            address = %self.config.destination_address,
            packet_size = self.config.packet_size,
            packet_count,
            "echo session started"
        );
        reporter.session_started(&self.config);
        if !self.transport.is_open() {
            tracing::warn!("transport is closed, every probe will be lost");
        }

        let mut results = Vec::with_capacity(usize::from(packet_count));
        for probe in 0..packet_count {
            let result = self.probe();
            reporter.probe_settled(&result);

            if probe + 1 < packet_count {
                let pause = pacing_delay(self.config.probe_interval, result.delay());
                if !pause.is_zero() {
                    std::thread::sleep(pause);
                }
            }
            results.push(result);
        }

        self.transport.close();
        let lost = results.iter().filter(|result| result.is_timeout()).count();
        tracing::info!(sent = results.len(), lost, "echo session finished");
        results
    }

    // Idle -> Sent -> Settled for the current sequence number.
    fn probe(&mut self) -> ProbeResult {
        let sequence_number = self.sequence_number;
        self.sequence_number = sequence_number.next();

        let sent_at = match self.send(sequence_number) {
            Ok(sent_at) => sent_at,
            Err(e) => {
                tracing::warn!(%sequence_number, "could not send echo request: {}", e);
                return ProbeResult::lost(sequence_number.into(), Instant::now());
            }
        };

        let deadline = reply_deadline(sent_at, self.config.timeout);
        match self.receive(sequence_number, deadline) {
            Ok(Some(reply)) => {
                let result = ProbeResult::replied(
                    sequence_number.into(),
                    sent_at,
                    reply.received_at,
                    reply.ttl,
                    reply.package_size,
                );
                tracing::debug!(%sequence_number, delay_millis = result.delay_millis, "probe settled");
                result
            }
            Ok(None) => {
                tracing::debug!(%sequence_number, "probe timed out");
                ProbeResult::lost(sequence_number.into(), sent_at)
            }
            Err(e) => {
                tracing::warn!(%sequence_number, "could not receive echo reply: {}", e);
                ProbeResult::lost(sequence_number.into(), sent_at)
            }
        }
    }

    fn send(&self, sequence_number: SequenceNumber) -> PingResult<Instant> {
        let packet = encode(self.config.identifier, sequence_number, self.config.payload_size())?;
        self.transport.send(&packet, self.config.destination_address)
    }

    fn receive(&mut self, sequence_number: SequenceNumber, deadline: Instant) -> PingResult<Option<EchoReply>> {
        loop {
            match self.transport.receive_until(deadline)? {
                EchoReceive::Timeout => return Ok(None),
                EchoReceive::Reply(reply) if reply.sequence_number == sequence_number => return Ok(Some(reply)),
                EchoReceive::Reply(reply) => match self.config.sequence_matching {
                    // A late reply to an earlier probe settles the current one.
                    SequenceMatching::IdentifierOnly => {
                        tracing::debug!(
                            expected = %sequence_number,
                            received = %reply.sequence_number,
                            "accepting echo reply with other sequence number"
                        );
                        return Ok(Some(reply));
                    }
                    SequenceMatching::IdentifierAndSequence => {
                        tracing::trace!(
                            expected = %sequence_number,
                            received = %reply.sequence_number,
                            "discarding stale echo reply"
                        );
                    }
                },
            }
        }
    }
}
