use std::collections::VecDeque;

/// Identifier of one requested display refresh. Issued by the engine in increasing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameTicket(pub u64);

/// Host refresh signal: the `requestAnimationFrame` / `cancelAnimationFrame` pair.
///
/// After `request(t)` the host is expected to call
/// [`StimulusEngine::on_refresh`](crate::StimulusEngine::on_refresh) with `t` at the next display
/// refresh. `cancel(t)` withdraws a request that has not fired yet. Neither call may block.
pub trait RefreshScheduler {
    /// Ask for one callback at the next refresh.
    fn request(&mut self, ticket: FrameTicket);
    /// Withdraw a pending request.
    fn cancel(&mut self, ticket: FrameTicket);
}

impl<R: RefreshScheduler + ?Sized> RefreshScheduler for Box<R> {
    fn request(&mut self, ticket: FrameTicket) {
        (**self).request(ticket)
    }

    fn cancel(&mut self, ticket: FrameTicket) {
        (**self).cancel(ticket)
    }
}

/// Refresh scheduler that queues requests until a driver fires them.
#[derive(Debug, Default)]
pub struct ManualRefresh {
    queue: VecDeque<FrameTicket>,
    requested: u64,
    cancelled: u64,
}

impl ManualRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest outstanding request.
    pub fn next_due(&mut self) -> Option<FrameTicket> {
        self.queue.pop_front()
    }

    /// Outstanding requests.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn requested_count(&self) -> u64 {
        self.requested
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl RefreshScheduler for ManualRefresh {
    fn request(&mut self, ticket: FrameTicket) {
        self.requested += 1;
        self.queue.push_back(ticket);
    }

    fn cancel(&mut self, ticket: FrameTicket) {
        let before = self.queue.len();
        self.queue.retain(|&t| t != ticket);
        if self.queue.len() != before {
            self.cancelled += 1;
        }
    }
}
