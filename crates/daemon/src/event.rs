//! Internal event vocabulary (spec.md §4.9), drained through a `match`
//! dispatch table each iteration of the single-threaded, readiness-based
//! (poll-style) event loop (see `DESIGN.md` for the grounding).

use semadraw_session::ClientId;

#[derive(Debug)]
pub enum DaemonEvent {
    /// One of the listener fds is readable: a new connection is pending.
    NewConnection { network: bool },
    /// A connected client's socket is readable.
    ClientReadable(ClientId),
    /// The active backend's `poll_events` should be invoked this tick.
    BackendEvents,
    /// The scheduler's deadline has passed; a composite pass is due.
    SchedulerTick,
    /// A graceful shutdown was requested (backend requested exit, or a
    /// client sent `disconnect` that happened to be the last connection and
    /// no listeners remain bound — in practice driven by `Runtime::run`'s
    /// own loop condition rather than enqueued by a source).
    Shutdown,
}
