//! In-process publish/subscribe.
//!
//! The [`EventBus`] is the only channel between the [`crate::Session`] (which
//! mutates state) and the renderers (which redraw it). It is constructed once
//! at startup and shared by handle; tests build one per case.
//!
//! # Delivery
//!
//! - `notify` is synchronous: every subscriber has been delivered to when it
//!   returns.
//! - The subscriber set is snapshotted before delivery. Callbacks may
//!   subscribe, unsubscribe or notify re-entrantly; changes take effect from
//!   the next notification.
//! - Order across subscribers is unspecified. Subscribers must not rely on it.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use tokio::sync::mpsc;

use crate::Message;

/// Closed set of notification topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Connection status or local identity changed.
    Identity,
    /// User roster changed.
    Roster,
    /// Room directory or current room changed.
    Rooms,
    /// Message log changed.
    MessageLog,
    /// Input buffer or cursor changed.
    InputBar,
    /// User asked to submit the input buffer.
    SubmitRequested,
    /// Application should exit. Carries [`Payload::Exit`] when the backend
    /// died.
    ExitRequested,
    /// A message was appended. Carries [`Payload::Message`].
    MessageAppended,
}

/// Optional value attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// The appended message.
    Message(Message),
    /// Exit code to terminate with.
    Exit {
        /// Process exit code.
        code: i32,
    },
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Topic notified.
    pub topic: Topic,
    /// Attached value. `None` for plain refresh notifications.
    pub payload: Option<Payload>,
}

impl Notification {
    /// Notification without a payload.
    pub fn refresh(topic: Topic) -> Self {
        Self { topic, payload: None }
    }

    /// Notification carrying a payload.
    pub fn with(topic: Topic, payload: Payload) -> Self {
        Self { topic, payload: Some(payload) }
    }
}

/// Identifies a subscriber within a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    /// Create a subscriber id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for SubscriberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

type Callback = Rc<dyn Fn(Option<&Payload>)>;

#[derive(Clone)]
enum Sink {
    Callback(Callback),
    Mailbox(mpsc::UnboundedSender<Notification>),
}

struct Subscriber {
    id: SubscriberId,
    sink: Sink,
}

/// Topic-based event bus.
#[derive(Default)]
pub struct EventBus {
    topics: RefCell<HashMap<Topic, Vec<Subscriber>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `topic` under `id`.
    ///
    /// Subscribing an id already present on the topic replaces its callback.
    pub fn subscribe(
        &self,
        topic: Topic,
        id: impl Into<SubscriberId>,
        callback: impl Fn(Option<&Payload>) + 'static,
    ) {
        self.insert(topic, id.into(), Sink::Callback(Rc::new(callback)));
    }

    /// Register a mailbox for every topic in `topics` under `id`.
    ///
    /// Notifications are queued in the mailbox and read by its owner at its
    /// own pace. Dropping the mailbox unsubscribes it lazily.
    pub fn subscribe_mailbox(&self, topics: &[Topic], id: impl Into<SubscriberId>) -> Mailbox {
        let id = id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        for &topic in topics {
            self.insert(topic, id.clone(), Sink::Mailbox(tx.clone()));
        }
        Mailbox { rx }
    }

    /// Remove `id` from `topic`. No-op if it is not subscribed.
    pub fn unsubscribe(&self, id: &SubscriberId, topic: Topic) {
        if let Some(subscribers) = self.topics.borrow_mut().get_mut(&topic) {
            subscribers.retain(|s| &s.id != id);
        }
    }

    /// Deliver a notification to every current subscriber of `topic`.
    pub fn notify(&self, topic: Topic, payload: Option<Payload>) {
        let sinks: Vec<Sink> = match self.topics.borrow().get(&topic) {
            Some(subscribers) => subscribers.iter().map(|s| s.sink.clone()).collect(),
            None => return,
        };

        let mut closed = false;
        for sink in sinks {
            match sink {
                Sink::Callback(callback) => callback(payload.as_ref()),
                Sink::Mailbox(tx) => {
                    closed |= tx.send(Notification { topic, payload: payload.clone() }).is_err();
                },
            }
        }

        if closed && let Some(subscribers) = self.topics.borrow_mut().get_mut(&topic) {
            subscribers.retain(|s| !matches!(&s.sink, Sink::Mailbox(tx) if tx.is_closed()));
        }
    }

    /// Deliver a prepared notification.
    pub fn publish(&self, notification: Notification) {
        self.notify(notification.topic, notification.payload);
    }

    /// Number of subscribers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.borrow().get(&topic).map_or(0, Vec::len)
    }

    fn insert(&self, topic: Topic, id: SubscriberId, sink: Sink) {
        let mut topics = self.topics.borrow_mut();
        let subscribers = topics.entry(topic).or_default();
        match subscribers.iter_mut().find(|s| s.id == id) {
            Some(existing) => existing.sink = sink,
            None => subscribers.push(Subscriber { id, sink }),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.borrow();
        let mut map = f.debug_map();
        for (topic, subscribers) in topics.iter() {
            map.entry(topic, &subscribers.iter().map(|s| &s.id).collect::<Vec<_>>());
        }
        map.finish()
    }
}

/// Receiving end of a mailbox subscription.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Mailbox {
    /// Next queued notification, if any.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Take every queued notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
