//! Per-session counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct SessionStats {
    /// Requests issued (retries not included).
    pub requests: u64,
    /// Responses matched to a request.
    pub responses: u64,
    /// Attempts that got no usable reply before the deadline.
    pub timeouts: u64,
    /// Resends after a timeout or a corrupt reply.
    pub retries: u64,
    /// PMPP frames whose FCS did not match.
    pub crc_errors: u64,
    /// Replies that could not be unframed or decoded.
    pub decode_errors: u64,
    /// Well-formed replies for some other request id.
    pub stale: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) requests: AtomicU64,
    pub(crate) responses: AtomicU64,
    pub(crate) timeouts: AtomicU64,
    pub(crate) retries: AtomicU64,
    pub(crate) crc_errors: AtomicU64,
    pub(crate) decode_errors: AtomicU64,
    pub(crate) stale: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SessionStats {
        SessionStats {
            requests: self.requests.load(Ordering::Relaxed),
            responses: self.responses.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            crc_errors: self.crc_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.requests,
            &self.responses,
            &self.timeouts,
            &self.retries,
            &self.crc_errors,
            &self.decode_errors,
            &self.stale,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let counters = Counters::default();
        Counters::bump(&counters.requests);
        Counters::bump(&counters.requests);
        Counters::bump(&counters.crc_errors);

        let stats = counters.snapshot();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.crc_errors, 1);
        assert_eq!(stats.timeouts, 0);

        counters.reset();
        assert_eq!(counters.snapshot(), SessionStats::default());
    }
}
