use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{error, warn};

use super::model::{Kind, Notification};
use super::repository::FileRepository;

type Listener = Arc<dyn Fn(&[Notification]) + Send + Sync>;
type NativeNotifier = Box<dyn Fn(&Notification) + Send + Sync>;

// newest first, at most CAPACITY entries; every mutation persists, then
// synchronously calls every registered listener
pub struct NotificationService {
    repository: FileRepository,
    notifications: Mutex<Vec<Notification>>,
    listeners: Mutex<HashMap<u64, Listener>>,
    listener_seq: AtomicU64,
    native: Option<NativeNotifier>,
}

impl NotificationService {
    pub fn new(repository: FileRepository) -> Self {
        let notifications = repository.load().unwrap_or_else(|e| {
            warn!("failed to load persisted notifications: {e}");
            Vec::new()
        });

        Self {
            repository,
            notifications: Mutex::new(notifications),
            listeners: Mutex::new(HashMap::new()),
            listener_seq: AtomicU64::new(0),
            native: None,
        }
    }

    // the caller has already obtained permission; the store never requests it
    pub fn with_native_notifier(
        mut self,
        notifier: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> Self {
        self.native = Some(Box::new(notifier));
        self
    }
}

impl NotificationService {
    pub fn add(
        &self,
        kind: Kind,
        title: &str,
        message: &str,
        data: Option<serde_json::Value>,
    ) -> Notification {
        let notification = Notification::new(kind, title, message, data);

        let snapshot = {
            let mut notifications = lock(&self.notifications);
            notifications.insert(0, notification.clone());
            notifications.truncate(super::CAPACITY);
            notifications.clone()
        };

        self.persist(&snapshot);
        self.notify_listeners(&snapshot);

        if let Some(native) = &self.native {
            native(&notification);
        }

        notification
    }

    pub fn find_all(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    pub fn unread_count(&self) -> usize {
        lock(&self.notifications).iter().filter(|n| !n.read).count()
    }

    // returns true iff the notification existed and was unread
    pub fn mark_read(&self, id: &uuid::Uuid) -> bool {
        let (changed, snapshot) = {
            let mut notifications = lock(&self.notifications);
            let changed = match notifications.iter_mut().find(|n| &n.id == id) {
                Some(n) if !n.read => {
                    n.read = true;
                    true
                }
                _ => false,
            };
            (changed, notifications.clone())
        };

        if changed {
            self.persist(&snapshot);
            self.notify_listeners(&snapshot);
        }
        changed
    }

    pub fn mark_all_read(&self) {
        let snapshot = {
            let mut notifications = lock(&self.notifications);
            for n in notifications.iter_mut() {
                n.read = true;
            }
            notifications.clone()
        };

        self.persist(&snapshot);
        self.notify_listeners(&snapshot);
    }

    pub fn delete(&self, id: &uuid::Uuid) -> bool {
        let (changed, snapshot) = {
            let mut notifications = lock(&self.notifications);
            let before = notifications.len();
            notifications.retain(|n| &n.id != id);
            (notifications.len() != before, notifications.clone())
        };

        if changed {
            self.persist(&snapshot);
            self.notify_listeners(&snapshot);
        }
        changed
    }

    pub fn clear(&self) {
        let snapshot = {
            let mut notifications = lock(&self.notifications);
            notifications.clear();
            notifications.clone()
        };

        self.persist(&snapshot);
        self.notify_listeners(&snapshot);
    }

    // the returned closure unsubscribes; after that the listener never runs
    pub fn add_listener(
        self: &Arc<Self>,
        listener: impl Fn(&[Notification]) + Send + Sync + 'static,
    ) -> impl FnOnce() + Send + 'static {
        let id = self.listener_seq.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).insert(id, Arc::new(listener));

        let this = Arc::clone(self);
        move || {
            lock(&this.listeners).remove(&id);
        }
    }
}

impl NotificationService {
    // a persistence failure degrades the store to in-memory, never fatal
    fn persist(&self, snapshot: &[Notification]) {
        if let Err(e) = self.repository.save(snapshot) {
            warn!("failed to persist notifications: {e}");
        }
    }

    // a panicking listener must not break delivery to the rest
    fn notify_listeners(&self, snapshot: &[Notification]) {
        let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                error!("notification listener panicked");
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
