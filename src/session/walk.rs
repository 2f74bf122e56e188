//! GETNEXT subtree walk.

use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::ber::SnmpType;
use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::transport::Transport;
use crate::variable::Variable;

use super::Session;

type PendingNext = Pin<Box<dyn Future<Output = Result<Variable>> + Send>>;

/// Stream of the bindings under a subtree, in agent order.
///
/// Ends when the agent returns an OID outside the subtree, `endOfMibView`,
/// or (SNMPv1) a `noSuchName` error. An OID that does not increase is
/// reported as [`Error::NonIncreasingOid`] and ends the walk, so a broken
/// agent cannot loop it forever.
pub struct Walk<T: Transport> {
    session: Session<T>,
    base_oid: Oid,
    current_oid: Oid,
    last_returned_oid: Option<Oid>,
    done: bool,
    pending: Option<PendingNext>,
}

impl<T: Transport> Walk<T> {
    pub(crate) fn new(session: Session<T>, oid: Oid) -> Self {
        Self {
            session,
            base_oid: oid.clone(),
            current_oid: oid,
            last_returned_oid: None,
            done: false,
            pending: None,
        }
    }

    /// Next binding, or `None` at the end of the subtree.
    pub async fn next_binding(&mut self) -> Result<Option<Variable>> {
        poll_fn(|cx| Pin::new(&mut *self).poll_next(cx))
            .await
            .transpose()
    }

    fn accept(&mut self, var: Variable) -> Option<Result<Variable>> {
        if var.type_code == SnmpType::EndOfMibView || !var.identifier.starts_with(&self.base_oid)
        {
            self.done = true;
            return None;
        }

        if let Some(last_oid) = self.last_returned_oid.take()
            && var.identifier <= last_oid
        {
            self.done = true;
            return Some(Err(Error::NonIncreasingOid {
                previous: last_oid,
                current: var.identifier,
            }));
        }

        self.current_oid = var.identifier.clone();
        self.last_returned_oid = Some(var.identifier.clone());
        Some(Ok(var))
    }
}

impl<T: Transport> Stream for Walk<T> {
    type Item = Result<Variable>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        if self.pending.is_none() {
            let session = self.session.clone();
            let oid = self.current_oid.clone();
            self.pending = Some(Box::pin(async move { session.get_next(&oid).await }));
        }
        let Some(pending) = self.pending.as_mut() else {
            return Poll::Ready(None);
        };

        let result = match pending.as_mut().poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };
        self.pending = None;

        match result {
            Ok(var) => Poll::Ready(self.accept(var)),
            // v1 agents signal the end of the MIB this way
            Err(Error::Snmp {
                status: ErrorStatus::NoSuchName,
                ..
            }) => {
                self.done = true;
                Poll::Ready(None)
            }
            Err(e) => {
                self.done = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::pdu::{Pdu, PduType};
    use crate::transport::{MockReply, MockTransport};
    use bytes::Bytes;

    /// Agent holding a sorted table; answers GETNEXT from it.
    fn table_agent(table: Vec<Variable>) -> impl FnMut(&[u8]) -> Vec<MockReply> + Send + 'static {
        move |data| {
            let request = Pdu::decode(Bytes::copy_from_slice(data)).unwrap();
            let asked = &request.bindings[0].identifier;
            let mut response = request.clone();
            response.pdu_type = PduType::Response;
            match table.iter().find(|v| v.identifier > *asked) {
                Some(next) => response.bindings = vec![next.clone()],
                None => {
                    response.error_status = ErrorStatus::NoSuchName;
                    response.error_index = 1;
                }
            }
            vec![MockReply::Data(response.encode())]
        }
    }

    fn dms_table() -> Vec<Variable> {
        vec![
            Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 1, 0), 1),
            Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0), 2),
            Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 3, 0), 3),
            Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 2, 1, 0), 9),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_walk_stops_at_subtree_end() {
        let mock = MockTransport::new().with_responder(table_agent(dms_table()));
        let session = Session::builder(mock).build();

        let vars = session
            .walk_all(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1))
            .await
            .unwrap();
        let values: Vec<i32> = vars.iter().map(|v| v.to_i32().unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_walk_stops_on_no_such_name() {
        let mock = MockTransport::new().with_responder(table_agent(dms_table()));
        let session = Session::builder(mock.clone()).build();

        let vars = session
            .walk_all(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3))
            .await
            .unwrap();
        assert_eq!(vars.len(), 4);
        // Four hits plus the request that ran off the end
        assert_eq!(mock.sent_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_walk_rejects_non_increasing_oid() {
        let looping = Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 1, 0), 1);
        let mock = MockTransport::new().with_responder(move |data| {
            let mut response = Pdu::decode(Bytes::copy_from_slice(data)).unwrap();
            response.pdu_type = PduType::Response;
            response.bindings = vec![looping.clone()];
            vec![MockReply::Data(response.encode())]
        });
        let session = Session::builder(mock).build();

        let mut walk = session.walk(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3));
        assert!(walk.next_binding().await.unwrap().is_some());
        let err = walk.next_binding().await.unwrap_err();
        assert!(matches!(err, Error::NonIncreasingOid { .. }));
        assert!(walk.next_binding().await.unwrap().is_none());
    }
}
