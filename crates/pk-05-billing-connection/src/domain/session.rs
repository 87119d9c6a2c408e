//! # Connection Session
//!
//! The mutable heart of the connection: state, generation, waiting
//! connect callbacks, operations queued while connecting, and operations in
//! flight.
//!
//! ## Transitions
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──bound──▶ Connected
//!                               │                     │
//!                           bind failed          service lost
//!                               ▼                     ▼
//!                        FailedToConnect         Disconnected
//!
//! any ──disconnect()──▶ Disconnected
//! ```
//!
//! Every transition out of `Connecting` or `Connected` bumps the generation.
//! A completion carrying an older generation is stale and must be dropped.
//!
//! The session is generic over the callback type `C`, the queued-operation
//! type `Q` and the failure-handler type `F` so it stays free of executors.

use shared_types::{BillingError, ConnectionState, Operation, ServiceBinding};
use std::collections::HashMap;
use std::sync::Arc;

/// Identity of a connection callback. A callback registered twice for the
/// same session is told about service loss once.
pub trait SameListener {
    fn same_listener(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameListener for Arc<T> {
    fn same_listener(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Identity of one dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub id: u64,
    pub generation: u64,
    pub operation: Operation,
}

/// What a `connect()` call should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    /// Already connected; report success right away.
    AlreadyConnected,
    /// An attempt is outstanding; the callback joined it.
    Joined,
    /// A new bind attempt must be started for this generation.
    Start { generation: u64 },
}

/// Result of finishing a bind attempt.
pub struct ConnectOutcome<C, Q> {
    pub callbacks: Vec<C>,
    pub queued: Vec<Q>,
    pub result: Result<ServiceBinding, BillingError>,
}

/// What `disconnect()` tore down.
pub struct Teardown<C, Q, F> {
    pub previous: ConnectionState,
    pub waiting: Vec<C>,
    pub queued: Vec<Q>,
    pub in_flight: Vec<(Ticket, F)>,
}

impl<C, Q, F> Teardown<C, Q, F> {
    pub fn discarded(&self) -> usize {
        self.waiting.len() + self.queued.len() + self.in_flight.len()
    }
}

/// What a lost service took down.
pub struct ServiceLoss<C, F> {
    pub listeners: Vec<C>,
    pub in_flight: Vec<(Ticket, F)>,
}

pub struct Session<C, Q, F> {
    state: ConnectionState,
    generation: u64,
    binding: Option<ServiceBinding>,
    waiting: Vec<C>,
    listeners: Vec<C>,
    queued: Vec<Q>,
    in_flight: HashMap<u64, (Ticket, F)>,
    next_ticket: u64,
}

impl<C: Clone + SameListener, Q, F> Default for Session<C, Q, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone + SameListener, Q, F> Session<C, Q, F> {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            generation: 0,
            binding: None,
            waiting: Vec::new(),
            listeners: Vec::new(),
            queued: Vec::new(),
            in_flight: HashMap::new(),
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn binding(&self) -> Option<ServiceBinding> {
        self.binding
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn connect(&mut self, callback: C) -> ConnectStep {
        match self.state {
            ConnectionState::Connected => {
                self.add_listener(callback);
                ConnectStep::AlreadyConnected
            }
            ConnectionState::Connecting => {
                self.waiting.push(callback);
                ConnectStep::Joined
            }
            ConnectionState::Disconnected | ConnectionState::FailedToConnect => {
                self.generation += 1;
                self.state = ConnectionState::Connecting;
                self.waiting.push(callback);
                ConnectStep::Start {
                    generation: self.generation,
                }
            }
        }
    }

    /// Settle the bind attempt of `generation`. `None` when the attempt is
    /// stale.
    pub fn finish_connect(
        &mut self,
        generation: u64,
        result: Result<ServiceBinding, BillingError>,
    ) -> Option<ConnectOutcome<C, Q>> {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            return None;
        }
        let callbacks = std::mem::take(&mut self.waiting);
        let queued = std::mem::take(&mut self.queued);
        match &result {
            Ok(binding) => {
                self.state = ConnectionState::Connected;
                self.binding = Some(*binding);
                for callback in &callbacks {
                    self.add_listener(callback.clone());
                }
            }
            Err(_) => {
                self.state = ConnectionState::FailedToConnect;
                self.binding = None;
                self.generation += 1;
            }
        }
        Some(ConnectOutcome {
            callbacks,
            queued,
            result,
        })
    }

    fn add_listener(&mut self, callback: C) {
        if !self.listeners.iter().any(|known| known.same_listener(&callback)) {
            self.listeners.push(callback);
        }
    }

    /// Tear the session down. Always ends in `Disconnected`.
    pub fn disconnect(&mut self) -> Teardown<C, Q, F> {
        let previous = self.state;
        if matches!(
            previous,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            self.generation += 1;
        }
        self.state = ConnectionState::Disconnected;
        self.binding = None;
        self.listeners.clear();
        Teardown {
            previous,
            waiting: std::mem::take(&mut self.waiting),
            queued: std::mem::take(&mut self.queued),
            in_flight: self.in_flight.drain().map(|(_, entry)| entry).collect(),
        }
    }

    /// The remote service went away while `generation` was connected.
    pub fn service_lost(&mut self, generation: u64) -> Option<ServiceLoss<C, F>> {
        if generation != self.generation || self.state != ConnectionState::Connected {
            return None;
        }
        self.generation += 1;
        self.state = ConnectionState::Disconnected;
        self.binding = None;
        Some(ServiceLoss {
            listeners: std::mem::take(&mut self.listeners),
            in_flight: self.in_flight.drain().map(|(_, entry)| entry).collect(),
        })
    }

    /// Hold an operation until the outstanding bind settles.
    pub fn enqueue(&mut self, queued: Q) {
        self.queued.push(queued);
    }

    /// Track an operation of the current generation. `fail` is invoked if the
    /// service is lost before the operation completes.
    pub fn register(&mut self, operation: Operation, fail: F) -> Ticket {
        let ticket = Ticket {
            id: self.next_ticket,
            generation: self.generation,
            operation,
        };
        self.next_ticket += 1;
        self.in_flight.insert(ticket.id, (ticket, fail));
        ticket
    }

    pub fn is_live(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && self.in_flight.contains_key(&ticket.id)
    }

    /// Take ownership of the outcome. Only one claim per ticket succeeds, and
    /// none after the generation moved on.
    pub fn claim(&mut self, ticket: &Ticket) -> bool {
        self.take(ticket).is_some()
    }

    /// Like [`claim`](Self::claim), handing back the failure handler.
    pub fn take(&mut self, ticket: &Ticket) -> Option<F> {
        if ticket.generation != self.generation {
            return None;
        }
        self.in_flight.remove(&ticket.id).map(|(_, fail)| fail)
    }

    /// Swap the failure handler of a live ticket.
    pub fn rearm(&mut self, ticket: &Ticket, fail: F) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match self.in_flight.get_mut(&ticket.id) {
            Some(entry) => {
                entry.1 = fail;
                true
            }
            None => false,
        }
    }
}
