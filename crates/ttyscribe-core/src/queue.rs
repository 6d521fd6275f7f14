//! Bounded hand-off queue for transcript events.
//!
//! Single producer (the terminal worker) and single consumer. When the
//! consumer falls behind, the oldest events are dropped so capture never
//! blocks the worker; drops are counted for diagnostics.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;
use tracing::warn;

use crate::events::TranscriptEvent;

pub struct TranscriptQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

struct Inner {
    events: VecDeque<TranscriptEvent>,
    closed: bool,
}

impl TranscriptQueue {
    /// Create a queue holding at most `capacity` events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Append an event. On overflow the oldest event is dropped so the
    /// newest output always survives. No-op after `close`.
    pub fn push(&self, event: TranscriptEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.closed {
            return;
        }
        if inner.events.len() == self.capacity {
            inner.events.pop_front();
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if total == 1 || total % 1000 == 0 {
                warn!(total, "transcript queue overflow, dropping oldest");
            }
        }
        inner.events.push_back(event);
        drop(inner);
        self.notify.notify_one();
    }

    /// Take the next event without waiting.
    pub fn try_recv(&self) -> Option<TranscriptEvent> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.events.pop_front()
    }

    /// Wait for the next event. Returns `None` once the queue is closed and
    /// drained.
    pub async fn recv(&self) -> Option<TranscriptEvent> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(event) = inner.events.pop_front() {
                    return Some(event);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Close the queue. Buffered events remain readable; `recv` returns
    /// `None` after the backlog drains.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.closed = true;
        drop(inner);
        self.notify.notify_waiters();
    }

    /// Events dropped to overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSource;

    fn event(text: &str) -> TranscriptEvent {
        TranscriptEvent::append(format!("{text}\n"), EventSource::History)
    }

    #[test]
    fn fifo_order() {
        let queue = TranscriptQueue::new(8);
        queue.push(event("a"));
        queue.push(event("b"));
        assert_eq!(queue.try_recv().unwrap().text, "a\n");
        assert_eq!(queue.try_recv().unwrap().text, "b\n");
        assert!(queue.try_recv().is_none());
    }

    #[test]
    fn overflow_drops_oldest_and_counts() {
        let queue = TranscriptQueue::new(2);
        queue.push(event("a"));
        queue.push(event("b"));
        queue.push(event("c"));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.try_recv().unwrap().text, "b\n");
        assert_eq!(queue.try_recv().unwrap().text, "c\n");
    }

    #[tokio::test]
    async fn recv_drains_backlog_then_sees_close() {
        let queue = TranscriptQueue::new(8);
        queue.push(event("a"));
        queue.close();
        assert_eq!(queue.recv().await.unwrap().text, "a\n");
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn recv_wakes_on_push() {
        let queue = std::sync::Arc::new(TranscriptQueue::new(8));
        let consumer = {
            let queue = std::sync::Arc::clone(&queue);
            tokio::spawn(async move { queue.recv().await })
        };
        tokio::task::yield_now().await;
        queue.push(event("late"));
        let received = consumer.await.unwrap().unwrap();
        assert_eq!(received.text, "late\n");
    }
}
