use crate::{ProbeResult, SessionConfig};

/// Receives the progress of an echo session, e.g. to print it.
pub trait ProbeReport {
    /// Called once before the first probe is sent.
    fn session_started(&mut self, config: &SessionConfig) {
        let _ = config;
    }

    /// Called for every probe once it has a reply or has timed out.
    fn probe_settled(&mut self, result: &ProbeResult) {
        let _ = result;
    }
}

/// Discards all progress.
impl ProbeReport for () {}
