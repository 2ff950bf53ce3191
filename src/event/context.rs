use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, watch};

use super::model::Outbound;

pub const OUTBOX_CAPACITY: usize = 32;

// shared between the service surface and the socket pump
#[derive(Clone)]
pub struct Channel {
    connected: Arc<watch::Sender<bool>>,
    outbox: Arc<Mutex<VecDeque<Outbound>>>,
    closed: Arc<AtomicBool>,
    pub wake: Arc<Notify>,
    pub close: Arc<Notify>,
}

impl Channel {
    pub fn new() -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            connected: Arc::new(connected),
            outbox: Arc::new(Mutex::new(VecDeque::new())),
            closed: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            close: Arc::new(Notify::new()),
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    pub fn set_connected(&self, up: bool) {
        self.connected.send_replace(up);
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    pub fn enqueue(&self, out: Outbound) -> super::Result<()> {
        if self.is_closed() {
            return Err(super::Error::Closed);
        }

        let mut outbox = lock(&self.outbox);
        if outbox.len() >= OUTBOX_CAPACITY {
            return Err(super::Error::OutboxFull);
        }
        outbox.push_back(out);
        drop(outbox);

        self.wake.notify_one();
        Ok(())
    }

    pub fn pop_outbound(&self) -> Option<Outbound> {
        lock(&self.outbox).pop_front()
    }

    // a frame that failed to write goes out first on the next connection
    pub fn requeue_front(&self, out: Outbound) {
        lock(&self.outbox).push_front(out);
    }

    pub fn pending(&self) -> Vec<Outbound> {
        lock(&self.outbox).iter().cloned().collect()
    }

    // queued frames are dropped, never retried after close
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.outbox).clear();
        self.close.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn lock<'m>(m: &'m Mutex<VecDeque<Outbound>>) -> MutexGuard<'m, VecDeque<Outbound>> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
