use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use super::attachment::Attachment;
use super::message::{Message, Role};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, user-visible notification (toast)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Events emitted after every state transition so views can re-render.
#[derive(Clone, Debug)]
pub enum StoreEvent {
    MessageAppended(Message),
    LoadingChanged(bool),
    ErrorChanged(Option<String>),
    AttachmentChanged(Option<Attachment>),
    /// An attachment started or finished processing
    ProcessingChanged(bool),
    Notice(Notice),
    Cleared,
}

pub type StoreListener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Point-in-time copy of the session state
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub loading: bool,
    pub attachment: Option<Attachment>,
    pub error: Option<String>,
}

#[derive(Default)]
struct SessionState {
    messages: Vec<Message>,
    loading: bool,
    attachment: Option<Attachment>,
    error: Option<String>,
    last_timestamp: Option<DateTime<Utc>>,
}

struct Inner {
    state: Mutex<SessionState>,
    listeners: Mutex<Vec<(u64, StoreListener)>>,
    next_listener_id: AtomicU64,
}

/// Single source of truth for one chat session.
///
/// Cheap to clone; every clone refers to the same state. The lock is never
/// held while listeners run, so a listener may read the store again.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<Inner>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::default()),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a listener; it stays active until the returned handle is dropped
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn emit(&self, event: StoreEvent) {
        let listeners: Vec<StoreListener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(&event);
        }
    }

    /// Append a message with a fresh id and a timestamp no earlier than the previous one
    pub fn append(&self, role: Role, content: impl Into<String>) -> Message {
        let message = {
            let mut state = self.inner.state.lock();
            let now = Utc::now();
            let created_at = match state.last_timestamp {
                Some(last) if last > now => last,
                _ => now,
            };
            state.last_timestamp = Some(created_at);

            let message = Message::new(role, content.into(), created_at);
            state.messages.push(message.clone());
            message
        };

        debug!(id = %message.id(), role = message.role().as_str(), "Message appended");
        self.emit(StoreEvent::MessageAppended(message.clone()));
        message
    }

    pub fn set_loading(&self, loading: bool) {
        let changed = {
            let mut state = self.inner.state.lock();
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        };

        if changed {
            self.emit(StoreEvent::LoadingChanged(loading));
        }
    }

    /// Set or clear the last error. Each `Some` raises exactly one error notice.
    pub fn set_error(&self, error: Option<String>) {
        self.inner.state.lock().error = error.clone();

        if let Some(message) = &error {
            self.emit(StoreEvent::Notice(Notice::error(message.clone())));
        }
        self.emit(StoreEvent::ErrorChanged(error));
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    /// Remove every message
    pub fn clear(&self) {
        self.inner.state.lock().messages.clear();
        debug!("Conversation cleared");
        self.emit(StoreEvent::Cleared);
    }

    /// Replace the current attachment; the previous one is discarded
    pub fn set_attachment(&self, attachment: Option<Attachment>) {
        self.inner.state.lock().attachment = attachment.clone();
        self.emit(StoreEvent::AttachmentChanged(attachment));
    }

    pub fn clear_attachment(&self) {
        self.set_attachment(None);
    }

    pub(crate) fn processing_changed(&self, processing: bool) {
        self.emit(StoreEvent::ProcessingChanged(processing));
    }

    /// Broadcast a transient notice without touching state
    pub fn notify(&self, notice: Notice) {
        self.emit(StoreEvent::Notice(notice));
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }

    /// Messages sent so far, in order, for use as request history
    pub fn history(&self) -> Vec<Message> {
        self.messages()
    }

    pub fn message_count(&self) -> usize {
        self.inner.state.lock().messages.len()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.inner.state.lock().attachment.clone()
    }

    pub fn has_attachment(&self) -> bool {
        self.inner.state.lock().attachment.is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.lock().error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock();
        SessionSnapshot {
            messages: state.messages.clone(),
            loading: state.loading,
            attachment: state.attachment.clone(),
            error: state.error.clone(),
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a store listener registered while alive
pub struct Subscription {
    inner: Weak<Inner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attachment::{AttachmentKind, MIME_PNG};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn recording_listener(store: &ConversationStore) -> (Subscription, Arc<Mutex<Vec<StoreEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription = store.subscribe(move |event| sink.lock().push(event.clone()));
        (subscription, events)
    }

    fn image_attachment(name: &str) -> Attachment {
        Attachment {
            id: Uuid::new_v4(),
            name: name.to_string(),
            mime_type: MIME_PNG.to_string(),
            size: 10,
            url: "data:image/png;base64,AAAA".to_string(),
            kind: AttachmentKind::Image,
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = ConversationStore::new();
        let snapshot = store.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.loading);
        assert!(snapshot.attachment.is_none());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_append_preserves_order_ids_and_timestamps() {
        let store = ConversationStore::new();
        for i in 0..50 {
            let role = if i % 2 == 0 { Role::User } else { Role::Model };
            store.append(role, format!("message {}", i));
        }

        let messages = store.messages();
        assert_eq!(messages.len(), 50);

        for (i, msg) in messages.iter().enumerate() {
            assert_eq!(msg.content(), format!("message {}", i));
        }

        for pair in messages.windows(2) {
            assert!(pair[0].created_at() <= pair[1].created_at());
        }

        let ids: HashSet<_> = messages.iter().map(|m| m.id()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_append_accepts_empty_content() {
        let store = ConversationStore::new();
        let msg = store.append(Role::User, "");
        assert_eq!(msg.content(), "");
        assert_eq!(store.message_count(), 1);
    }

    #[test]
    fn test_clear_empties_messages_only() {
        let store = ConversationStore::new();
        store.append(Role::User, "hi");
        store.set_attachment(Some(image_attachment("cat.png")));
        store.clear();

        assert_eq!(store.message_count(), 0);
        assert!(store.has_attachment());
    }

    #[test]
    fn test_set_error_emits_one_notice_per_assignment() {
        let store = ConversationStore::new();
        let (_sub, events) = recording_listener(&store);

        store.set_error(Some("boom".to_string()));
        store.set_error(Some("boom".to_string()));
        store.set_error(None);

        let notices: Vec<_> = events
            .lock()
            .iter()
            .filter_map(|e| match e {
                StoreEvent::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(notices, vec![Notice::error("boom"), Notice::error("boom")]);
        assert!(store.error().is_none());
    }

    #[test]
    fn test_set_loading_emits_only_on_change() {
        let store = ConversationStore::new();
        let (_sub, events) = recording_listener(&store);

        store.set_loading(true);
        store.set_loading(true);
        store.set_loading(false);
        store.set_loading(false);

        let changes: Vec<bool> = events
            .lock()
            .iter()
            .filter_map(|e| match e {
                StoreEvent::LoadingChanged(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![true, false]);
        assert!(!store.is_loading());
    }

    #[test]
    fn test_set_attachment_replaces_previous() {
        let store = ConversationStore::new();
        store.set_attachment(Some(image_attachment("first.png")));
        store.set_attachment(Some(image_attachment("second.png")));
        assert_eq!(store.attachment().unwrap().name, "second.png");

        store.clear_attachment();
        assert!(store.attachment().is_none());
    }

    #[test]
    fn test_dropping_subscription_stops_events() {
        let store = ConversationStore::new();
        let (sub, events) = recording_listener(&store);

        store.append(Role::User, "one");
        drop(sub);
        store.append(Role::User, "two");

        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_listener_can_read_store_during_event() {
        let store = ConversationStore::new();
        let reader = store.clone();
        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = seen.clone();
        let _sub = store.subscribe(move |event| {
            if let StoreEvent::MessageAppended(_) = event {
                *seen_clone.lock() = reader.message_count();
            }
        });

        store.append(Role::User, "hello");
        assert_eq!(*seen.lock(), 1);
    }
}
