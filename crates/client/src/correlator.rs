//! Matching replies to the requests that are waiting for them.

use std::collections::BTreeMap;

use keyhub_wire::{RequestId, Value};
use tokio::sync::oneshot;

use crate::Error;

/// Outcome delivered to a waiting caller.
pub type Settlement = Result<Value, Error>;

/// Channel end a caller waits on.
pub type Responder = oneshot::Sender<Settlement>;

/// A request that has been assigned an id and not yet settled.
#[derive(Debug)]
pub struct PendingRequest {
    id: RequestId,
    responder: Responder,
}

impl PendingRequest {
    /// Id of the request.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    fn settle(self, settlement: Settlement) {
        // The caller may have dropped its future; nobody is left to tell.
        let _ = self.responder.send(settlement);
    }
}

/// Owns the id counter and the in-flight requests of one connection epoch.
///
/// Ids start at 1 and strictly increase until [`reset`](Self::reset). Every
/// registered request is settled at most once: a reply for an id that is not
/// pending is ignored.
#[derive(Debug, Default)]
pub struct RequestCorrelator {
    last_id: RequestId,
    pending: BTreeMap<RequestId, PendingRequest>,
}

impl RequestCorrelator {
    /// Creates an empty correlator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id and records `responder` under it.
    pub fn register(&mut self, responder: Responder) -> RequestId {
        let id = self.last_id.next();
        self.last_id = id;
        self.pending.insert(id, PendingRequest { id, responder });
        id
    }

    /// Settles `id` with a result. Returns `false` if `id` was not pending.
    pub fn resolve(&mut self, id: RequestId, result: Value) -> bool {
        self.settle(id, Ok(result))
    }

    /// Settles `id` with an error. Returns `false` if `id` was not pending.
    pub fn reject(&mut self, id: RequestId, error: Error) -> bool {
        self.settle(id, Err(error))
    }

    /// Rejects every pending request with `error` and returns how many there
    /// were.
    pub fn reject_all(&mut self, error: &Error) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();

        for request in pending.into_values() {
            request.settle(Err(error.clone()));
        }

        count
    }

    /// Starts a new epoch: the counter returns to zero and nothing is pending.
    pub fn reset(&mut self) {
        self.last_id = RequestId::default();
        self.pending.clear();
    }

    /// Id the next registration will receive.
    #[must_use]
    pub const fn next_id(&self) -> RequestId {
        self.last_id.next()
    }

    /// Whether `id` is waiting for a reply.
    #[must_use]
    pub fn contains(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn settle(&mut self, id: RequestId, settlement: Settlement) -> bool {
        match self.pending.remove(&id) {
            Some(request) => {
                request.settle(settlement);
                true
            }
            None => false,
        }
    }
}
