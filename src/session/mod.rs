//! SNMP manager session.
//!
//! A [`Session`] owns a transport and turns operations into request/response
//! exchanges: it allocates request ids, frames for PMPP when configured,
//! waits with a per-attempt deadline, retries, and keeps counters.
//!
//! A PMPP frame with a bad FCS is counted in `crc_errors`. If its content
//! still decodes and matches a pending request it is accepted; if not, the
//! attempt of the request that read it is retried at once and is not also
//! counted as a timeout.

mod builder;
mod stats;
mod walk;

pub use builder::{SessionBuilder, SessionConfig};
pub use stats::SessionStats;
pub use walk::Walk;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::pmpp;
use crate::transport::Transport;
use crate::variable::Variable;

use stats::Counters;

/// SNMP manager session bound to one agent.
///
/// Cheap to clone; clones share the transport, request-id counter and stats.
/// Requests may run concurrently on clones: each reply is matched to its
/// request by request id, whatever order the agent answers in.
pub struct Session<T: Transport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: Transport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct SessionInner<T> {
    transport: T,
    config: SessionConfig,
    next_request_id: AtomicI32,
    counters: Counters,
    /// Requests awaiting a reply, by request id.
    pending: PendingMap,
    /// Held by the request currently reading the transport.
    reader: tokio::sync::Mutex<()>,
}

/// Result of waiting for one attempt's reply.
enum Attempt {
    Response(Pdu),
    TimedOut,
    Corrupt(Error),
}

impl<T: Transport> Session<T> {
    /// Start configuring a session on `transport`.
    pub fn builder(transport: T) -> SessionBuilder<T> {
        SessionBuilder::new(transport)
    }

    /// Create a session with an explicit configuration.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                config,
                next_request_id: AtomicI32::new(initial_request_id()),
                counters: Counters::default(),
                pending: Mutex::new(HashMap::new()),
                reader: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SessionStats {
        self.inner.counters.snapshot()
    }

    pub fn reset_stats(&self) {
        self.inner.counters.reset();
    }

    /// Next request id: positive, wrapping back to 1.
    fn next_request_id(&self) -> i32 {
        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        (id & i32::MAX).max(1)
    }

    fn request_pdu(&self, pdu_type: PduType) -> Pdu {
        let config = &self.inner.config;
        Pdu::new(config.version, config.community.clone(), pdu_type)
    }

    /// GET a single OID.
    ///
    /// A missing object comes back as a variable whose
    /// [`is_exception`](Variable::is_exception) is true (v2c), or as
    /// [`Error::Snmp`] with `noSuchName` (v1).
    pub async fn get(&self, oid: &Oid) -> Result<Variable> {
        let mut bindings = self.get_many(std::slice::from_ref(oid)).await?;
        first_binding(&mut bindings, oid)
    }

    /// GET several OIDs in one request. Bindings come back in request order.
    pub async fn get_many(&self, oids: &[Oid]) -> Result<Vec<Variable>> {
        let mut pdu = self.request_pdu(PduType::GetRequest);
        pdu.bindings = oids.iter().cloned().map(Variable::null).collect();
        self.request(pdu).await.map(|response| response.bindings)
    }

    /// GETNEXT: the first object after `oid`.
    pub async fn get_next(&self, oid: &Oid) -> Result<Variable> {
        let mut pdu = self.request_pdu(PduType::GetNextRequest);
        pdu.bindings = vec![Variable::null(oid.clone())];
        let mut bindings = self.request(pdu).await?.bindings;
        first_binding(&mut bindings, oid)
    }

    /// GETBULK (v2c only on the agent side).
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        non_repeaters: i32,
        max_repetitions: i32,
    ) -> Result<Vec<Variable>> {
        let config = &self.inner.config;
        let pdu = Pdu::get_bulk_request(
            config.version,
            config.community.clone(),
            non_repeaters,
            max_repetitions,
            oids,
        );
        self.request(pdu).await.map(|response| response.bindings)
    }

    /// SET one or more variables. Returns the agent's echo of the bindings.
    pub async fn set(&self, bindings: &[Variable]) -> Result<Vec<Variable>> {
        let mut pdu = self.request_pdu(PduType::SetRequest);
        pdu.bindings = bindings.to_vec();
        self.request(pdu).await.map(|response| response.bindings)
    }

    /// Walk the subtree under `oid` with GETNEXT.
    pub fn walk(&self, oid: Oid) -> Walk<T> {
        Walk::new(self.clone(), oid)
    }

    /// Walk the subtree under `oid` and collect every binding.
    pub async fn walk_all(&self, oid: Oid) -> Result<Vec<Variable>> {
        let mut walk = self.walk(oid);
        let mut out = Vec::new();
        while let Some(var) = walk.next_binding().await? {
            out.push(var);
        }
        Ok(out)
    }

    /// Send `pdu` and wait for the matching response, retrying on timeout.
    ///
    /// The request id is assigned here. An agent error status becomes
    /// [`Error::Snmp`]; a binding OID that cannot be encoded is rejected
    /// with [`Error::InvalidOid`] before anything is sent.
    pub async fn request(&self, mut pdu: Pdu) -> Result<Pdu> {
        pdu.validate()?;
        let inner = &*self.inner;
        let config = &inner.config;
        let request_id = self.next_request_id();
        pdu.set_request_id(request_id);
        let packet = pdu.to_packet(config.pmpp.as_ref());

        Counters::bump(&inner.counters.requests);
        tracing::debug!(target: "ntcip_snmp::session", { snmp.peer = %inner.transport.peer(), snmp.request_id = request_id, snmp.pdu_type = %pdu.pdu_type, snmp.bindings = pdu.bindings.len() }, "sending request");

        let start = Instant::now();
        let mut last_error = None;

        for attempt in 0..=config.retries {
            if attempt > 0 {
                Counters::bump(&inner.counters.retries);
                tracing::debug!(target: "ntcip_snmp::session", { snmp.request_id = request_id, snmp.attempt = attempt }, "retrying request");
            }

            // Registered before sending so another reader can route the reply
            let (sender, routed) = oneshot::channel();
            let _registration = Registration::new(&inner.pending, request_id, sender);

            inner.transport.send(&packet).await?;
            let deadline = Instant::now() + config.timeout;

            match self.await_response(request_id, routed, deadline).await? {
                Attempt::Response(response) => {
                    Counters::bump(&inner.counters.responses);
                    response.check_error()?;
                    return Ok(response);
                }
                Attempt::TimedOut => {
                    Counters::bump(&inner.counters.timeouts);
                    tracing::debug!(target: "ntcip_snmp::session", { snmp.request_id = request_id, snmp.attempt = attempt }, "attempt timed out");
                    last_error = Some(Error::Timeout {
                        elapsed: start.elapsed(),
                        request_id,
                        retries: attempt,
                    });
                }
                Attempt::Corrupt(err) => last_error = Some(err),
            }
        }

        Err(last_error.unwrap_or(Error::Timeout {
            elapsed: start.elapsed(),
            request_id,
            retries: config.retries,
        }))
    }

    /// Wait for the reply to `request_id` until the deadline passes.
    async fn await_response(
        &self,
        request_id: i32,
        mut routed: oneshot::Receiver<Pdu>,
        deadline: Instant,
    ) -> Result<Attempt> {
        match tokio::time::timeout_at(deadline, self.next_reply(request_id, &mut routed)).await {
            Ok(attempt) => attempt,
            Err(_) => Ok(Attempt::TimedOut),
        }
    }

    /// Wait until our reply is routed to us or read by us.
    ///
    /// One waiting request at a time holds the reader lock and reads the
    /// transport; replies for other pending requests are handed to their
    /// owners.
    async fn next_reply(
        &self,
        request_id: i32,
        routed: &mut oneshot::Receiver<Pdu>,
    ) -> Result<Attempt> {
        loop {
            tokio::select! {
                biased;
                response = &mut *routed => {
                    // The sender only goes away after sending
                    return Ok(match response {
                        Ok(response) => Attempt::Response(response),
                        Err(_) => Attempt::TimedOut,
                    });
                }
                _reading = self.inner.reader.lock() => {
                    if let Some(attempt) = self.read_reply(request_id).await? {
                        return Ok(attempt);
                    }
                }
            }
        }
    }

    /// Read one message from the transport.
    ///
    /// Returns the attempt outcome when the message is our reply or cannot
    /// be decoded. A reply for another pending request is passed to it; any
    /// other message is counted as stale.
    async fn read_reply(&self, request_id: i32) -> Result<Option<Attempt>> {
        let inner = &*self.inner;
        let data = inner.transport.recv().await?;

        let payload = if inner.config.pmpp.is_some() {
            match pmpp::decode(&data, false) {
                Ok(unframed) => {
                    if unframed.crc_error() {
                        Counters::bump(&inner.counters.crc_errors);
                    }
                    unframed.payload
                }
                Err(err) => {
                    Counters::bump(&inner.counters.decode_errors);
                    return Ok(Some(Attempt::Corrupt(err)));
                }
            }
        } else {
            data
        };

        let response = match Pdu::decode(payload) {
            Ok(response) => response,
            Err(err) => {
                Counters::bump(&inner.counters.decode_errors);
                tracing::debug!(target: "ntcip_snmp::session", { snmp.request_id = request_id, error = %err }, "undecodable reply");
                return Ok(Some(Attempt::Corrupt(err)));
            }
        };

        if response.pdu_type == PduType::Response {
            if response.request_id == request_id {
                tracing::trace!(target: "ntcip_snmp::session", { snmp.request_id = request_id, snmp.bindings = response.bindings.len() }, "response received");
                return Ok(Some(Attempt::Response(response)));
            }

            let owner = inner.pending.lock().unwrap().remove(&response.request_id);
            if let Some(owner) = owner {
                tracing::trace!(target: "ntcip_snmp::session", { snmp.request_id = response.request_id, snmp.reader = request_id }, "routing response to waiting request");
                let _ = owner.send(response);
                return Ok(None);
            }
        }

        Counters::bump(&inner.counters.stale);
        tracing::trace!(target: "ntcip_snmp::session", { snmp.request_id = request_id, snmp.received_id = response.request_id, snmp.pdu_type = %response.pdu_type }, "discarding unmatched reply");
        Ok(None)
    }
}

type PendingMap = Mutex<HashMap<i32, oneshot::Sender<Pdu>>>;

/// A request's entry in the pending map for one attempt. Dropping it
/// removes the entry, including when the attempt's future is cancelled.
struct Registration<'a> {
    pending: &'a PendingMap,
    request_id: i32,
}

impl<'a> Registration<'a> {
    fn new(pending: &'a PendingMap, request_id: i32, sender: oneshot::Sender<Pdu>) -> Self {
        pending.lock().unwrap().insert(request_id, sender);
        Self {
            pending,
            request_id,
        }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.pending.lock().unwrap().remove(&self.request_id);
    }
}

/// Take the first binding, failing if the agent returned none.
fn first_binding(bindings: &mut Vec<Variable>, requested: &Oid) -> Result<Variable> {
    if bindings.is_empty() {
        return Err(Error::Snmp {
            status: ErrorStatus::GenErr,
            index: 0,
            oid: Some(requested.clone()),
        });
    }
    Ok(bindings.swap_remove(0))
}

/// Time-seeded first request id, so a restarted manager does not reuse
/// the ids of its previous run.
fn initial_request_id() -> i32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as i32)
        .unwrap_or(1);
    (nanos & 0x3FFF_FFFF).max(1)
}
