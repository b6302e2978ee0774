use std::collections::HashMap;
use std::fmt::Display;

use tracing::{debug, trace};

use crate::psi::{SectionHandler, TableHandler, TableKind, TableSink};
use crate::unit::{Pid, Unit};
use crate::Result;

/// Outcome of routing a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// The unit was given to the handler attached for the PID.
    Dispatched(Pid),
    /// No handler is attached for the PID and the unit was dropped.
    Ignored(Pid),
}

impl Routed {
    #[must_use]
    pub fn pid(&self) -> Pid {
        match self {
            Routed::Dispatched(pid) | Routed::Ignored(pid) => *pid,
        }
    }
}

/// Dispatches units to table handlers by PID.
///
/// A router is owned by whoever drives it; handlers are attached and detached
/// explicitly and are released when the router is dropped.
#[derive(Default)]
pub struct ChannelRouter {
    handlers: HashMap<Pid, Box<dyn TableHandler>>,
}

impl ChannelRouter {
    /// Create a router with no handlers attached.
    #[must_use]
    pub fn new() -> Self {
        ChannelRouter::default()
    }

    /// Create a router with a [SectionHandler] attached on the PID of each table kind.
    #[must_use]
    pub fn with_tables(tables: &[TableKind]) -> Self {
        let mut router = ChannelRouter::new();
        for kind in tables {
            router.attach(kind.pid(), Box::new(SectionHandler::new(*kind)));
        }
        router
    }

    /// Attach `handler` for `pid`, returning any handler previously attached.
    pub fn attach(
        &mut self,
        pid: Pid,
        handler: Box<dyn TableHandler>,
    ) -> Option<Box<dyn TableHandler>> {
        debug!(pid, "attaching handler");
        self.handlers.insert(pid, handler)
    }

    /// Detach and return the handler for `pid`, if any.
    pub fn detach(&mut self, pid: Pid) -> Option<Box<dyn TableHandler>> {
        debug!(pid, "detaching handler");
        self.handlers.remove(&pid)
    }

    #[must_use]
    pub fn is_attached(&self, pid: Pid) -> bool {
        self.handlers.contains_key(&pid)
    }

    /// PIDs with a handler attached, in ascending order.
    #[must_use]
    pub fn pids(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self.handlers.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// Forward the full bytes of `unit` to the handler attached for its PID.
    ///
    /// # Errors
    /// Any error returned by the handler. Units for PIDs without a handler are not
    /// an error.
    pub fn route(&mut self, unit: &Unit, sink: &mut dyn TableSink) -> Result<Routed> {
        let pid = unit.pid();
        let Some(handler) = self.handlers.get_mut(&pid) else {
            trace!(pid, "no handler");
            return Ok(Routed::Ignored(pid));
        };
        handler.push(unit.as_bytes(), sink)?;
        Ok(Routed::Dispatched(pid))
    }
}

impl Display for ChannelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChannelRouter{{pids={:?}}}", self.pids())
    }
}
