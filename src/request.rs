//! Async request state container.
//!
//! A [`Request<T>`] gives a page a uniform way to trigger a backend call and
//! observe its lifecycle. Every call gets a fresh [`RequestTicket`] carrying a
//! monotonically increasing sequence number; only the ticket of the latest
//! call can settle the container. A response that arrives for an older ticket
//! is reported as [`Settled::Stale`] and leaves the state untouched.
//!
//! ```text
//! Idle ──trigger──▶ Pending ──settle(Ok)──▶ Succeeded(T)
//!                      │
//!                      └────settle(Err)──▶ Failed(msg)
//! ```
//!
//! The container does no I/O. The caller triggers, performs the call however
//! it likes (inline `await`, spawned task, ...), and settles with the result.

use std::fmt::Display;

/// What [`Request::trigger`] does while a call is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerPolicy {
    /// Refuse the new call. Prevents duplicate submissions.
    #[default]
    IgnoreWhilePending,
    /// Issue a new call; the pending one becomes stale.
    Supersede,
}

/// Identity of one call issued through a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    seq: u64,
}

impl RequestTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Lifecycle of the most recent call.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(String),
}

/// Outcome of [`Request::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    /// The ticket was superseded or already settled; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Request<T> {
    policy: TriggerPolicy,
    issued: u64,
    state: RequestState<T>,
    last_value: Option<T>,
    last_error: Option<String>,
}

impl<T> Default for Request<T> {
    fn default() -> Self {
        Self::new(TriggerPolicy::default())
    }
}

impl<T> Request<T> {
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            policy,
            issued: 0,
            state: RequestState::Idle,
            last_value: None,
            last_error: None,
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    /// Start a new call. Returns `None` when the policy refuses it.
    pub fn trigger(&mut self) -> Option<RequestTicket> {
        if self.is_pending() && self.policy == TriggerPolicy::IgnoreWhilePending {
            return None;
        }
        self.issued += 1;
        self.state = RequestState::Pending;
        Some(RequestTicket { seq: self.issued })
    }

    /// Whether `ticket` is the latest call and still awaiting a result.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.seq == self.issued && self.is_pending()
    }

    /// Record the result of the call identified by `ticket`.
    pub fn settle<E: Display>(&mut self, ticket: RequestTicket, result: Result<T, E>) -> Settled
    where
        T: Clone,
    {
        if !self.is_current(ticket) {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.issued,
                "discarding stale response"
            );
            return Settled::Stale;
        }

        match result {
            Ok(value) => {
                self.last_value = Some(value.clone());
                self.last_error = None;
                self.state = RequestState::Succeeded(value);
            }
            Err(e) => {
                let msg = e.to_string();
                self.last_error = Some(msg.clone());
                self.state = RequestState::Failed(msg);
            }
        }
        Settled::Applied
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, RequestState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RequestState::Pending)
    }

    pub fn has_succeeded(&self) -> bool {
        matches!(self.state, RequestState::Succeeded(_))
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, RequestState::Failed(_))
    }

    /// Last successful value, kept while a newer call is pending or failed.
    pub fn value(&self) -> Option<&T> {
        self.last_value.as_ref()
    }

    /// Error of the most recent failed call, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of calls issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let req: Request<u32> = Request::default();
        assert!(req.is_idle());
        assert!(req.value().is_none());
        assert!(req.error().is_none());
        assert_eq!(req.policy(), TriggerPolicy::IgnoreWhilePending);
    }

    #[test]
    fn ignore_while_pending_refuses_second_trigger() {
        let mut req: Request<u32> = Request::default();
        let first = req.trigger().unwrap();
        assert!(req.is_pending());
        assert!(req.trigger().is_none());
        assert_eq!(req.issued(), 1);

        assert_eq!(req.settle(first, Ok::<_, String>(7)), Settled::Applied);
        assert_eq!(req.state(), &RequestState::Succeeded(7));
        assert!(req.trigger().is_some());
    }

    #[test]
    fn settle_is_terminal_per_ticket() {
        let mut req: Request<u32> = Request::default();
        let t = req.trigger().unwrap();
        assert_eq!(req.settle(t, Ok::<_, String>(1)), Settled::Applied);
        assert_eq!(req.settle(t, Err("late failure")), Settled::Stale);
        assert_eq!(req.state(), &RequestState::Succeeded(1));
    }

    #[test]
    fn supersede_discards_older_ticket() {
        let mut req: Request<&str> = Request::new(TriggerPolicy::Supersede);
        let a = req.trigger().unwrap();
        let b = req.trigger().unwrap();
        assert!(b.seq() > a.seq());

        assert_eq!(req.settle(b, Ok::<_, String>("B")), Settled::Applied);
        assert_eq!(req.settle(a, Ok::<_, String>("A")), Settled::Stale);
        assert_eq!(req.value(), Some(&"B"));
    }

    #[test]
    fn stale_success_cannot_overwrite_pending_newer_call() {
        let mut req: Request<&str> = Request::new(TriggerPolicy::Supersede);
        let a = req.trigger().unwrap();
        let _b = req.trigger().unwrap();
        assert_eq!(req.settle(a, Ok::<_, String>("A")), Settled::Stale);
        assert!(req.is_pending());
        assert!(req.value().is_none());
    }

    #[test]
    fn failure_keeps_last_value_and_success_clears_error() {
        let mut req: Request<u32> = Request::default();
        let t = req.trigger().unwrap();
        req.settle(t, Ok::<_, String>(3));

        let t = req.trigger().unwrap();
        req.settle(t, Err("connection refused"));
        assert!(req.has_failed());
        assert_eq!(req.value(), Some(&3));
        assert_eq!(req.error(), Some("connection refused"));

        let t = req.trigger().unwrap();
        req.settle(t, Ok::<_, String>(4));
        assert!(req.error().is_none());
        assert_eq!(req.value(), Some(&4));
    }
}
