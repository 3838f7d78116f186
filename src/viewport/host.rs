use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use serde::{Deserialize, Serialize};

use super::types::{ClientRect, ScrollPosition, ViewportSize};

/// Platform events that can change the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostEvent {
    Resize,
    OrientationChange,
}

impl HostEvent {
    pub const ALL: [HostEvent; 2] = [HostEvent::Resize, HostEvent::OrientationChange];

    /// Platform event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostEvent::Resize => "resize",
            HostEvent::OrientationChange => "orientationchange",
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle returned by [`ViewportHost::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub type HostListener = Arc<dyn Fn(HostEvent) + Send + Sync>;

/// The display surface a [`ViewportRuler`](super::ViewportRuler) measures.
pub trait ViewportHost: Send + Sync {
    /// Size of the visible viewport.
    fn inner_size(&self) -> ViewportSize;

    /// Bounding rect of the document root, in client coordinates.
    fn document_rect(&self) -> ClientRect;

    /// Window-level scroll offset, used when the document rect reports no offset.
    fn scroll_position(&self) -> ScrollPosition;

    fn add_listener(&self, event: HostEvent, listener: HostListener) -> ListenerId;

    /// Returns false when `id` was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

impl<T> ViewportHost for Arc<T>
where
    T: ViewportHost + ?Sized,
{
    fn inner_size(&self) -> ViewportSize {
        (**self).inner_size()
    }

    fn document_rect(&self) -> ClientRect {
        (**self).document_rect()
    }

    fn scroll_position(&self) -> ScrollPosition {
        (**self).scroll_position()
    }

    fn add_listener(&self, event: HostEvent, listener: HostListener) -> ListenerId {
        (**self).add_listener(event, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        (**self).remove_listener(id)
    }
}

/// Listener bookkeeping shared by host implementations.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<ListenerId, (HostEvent, HostListener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, event: HostEvent, listener: HostListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, (event, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Calls every listener registered for `event`, in registration order.
    ///
    /// Listeners are snapshotted first so they can add or remove listeners.
    pub fn dispatch(&self, event: HostEvent) -> usize {
        let targets: Vec<HostListener> = self
            .lock()
            .values()
            .filter(|(registered, _)| *registered == event)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    pub fn count(&self, event: HostEvent) -> usize {
        self.lock()
            .values()
            .filter(|(registered, _)| *registered == event)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ListenerId, (HostEvent, HostListener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn dispatch_only_reaches_matching_listeners() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        registry.add(
            HostEvent::Resize,
            Arc::new(move |_: HostEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(registry.dispatch(HostEvent::OrientationChange), 0);
        assert_eq!(registry.dispatch(HostEvent::Resize), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = ListenerRegistry::new();
        let id = registry.add(HostEvent::Resize, Arc::new(|_: HostEvent| {}));

        assert_eq!(registry.count(HostEvent::Resize), 1);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.count(HostEvent::Resize), 0);
    }

    #[test]
    fn listener_may_unregister_itself_during_dispatch() {
        let registry = Arc::new(ListenerRegistry::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&registry);
        let own_id = Arc::clone(&slot);
        let id = registry.add(
            HostEvent::Resize,
            Arc::new(move |_: HostEvent| {
                if let (Some(registry), Some(id)) = (weak.upgrade(), *own_id.lock().unwrap()) {
                    registry.remove(id);
                }
            }),
        );
        *slot.lock().unwrap() = Some(id);

        registry.dispatch(HostEvent::Resize);
        assert_eq!(registry.count(HostEvent::Resize), 0);
    }

    #[test]
    fn event_names_match_platform() {
        assert_eq!(HostEvent::Resize.to_string(), "resize");
        assert_eq!(HostEvent::OrientationChange.as_str(), "orientationchange");
    }
}
