use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::host::{HostEvent, ListenerId, ViewportHost};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub(crate) type Sink = Arc<dyn Fn(HostEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SinkToken(u64);

#[derive(Default)]
struct SourceState {
    next_token: u64,
    sinks: BTreeMap<SinkToken, Sink>,
    registrations: Vec<ListenerId>,
}

/// Shares one native registration per [`HostEvent`] between all subscribers.
///
/// Registrations are made when the first sink attaches and removed when the
/// last one detaches.
pub(crate) struct ListenerSource {
    host: Arc<dyn ViewportHost>,
    state: Mutex<SourceState>,
}

impl ListenerSource {
    pub(crate) fn new(host: Arc<dyn ViewportHost>) -> Arc<Self> {
        Arc::new(Self {
            host,
            state: Mutex::new(SourceState::default()),
        })
    }

    pub(crate) fn attach(self: &Arc<Self>, sink: Sink) -> SinkToken {
        let mut state = self.state();
        let token = SinkToken(state.next_token);
        state.next_token += 1;
        state.sinks.insert(token, sink);

        if state.registrations.is_empty() {
            for event in HostEvent::ALL {
                // Weak: the host owns the callback, the source owns the host.
                let source = Arc::downgrade(self);
                let id = self.host.add_listener(
                    event,
                    Arc::new(move |event: HostEvent| {
                        if let Some(source) = source.upgrade() {
                            source.broadcast(event);
                        }
                    }),
                );
                state.registrations.push(id);
            }
            log_debug!("attached viewport listeners ({} events)", state.registrations.len());
        }

        token
    }

    pub(crate) fn detach(&self, token: SinkToken) {
        let mut state = self.state();
        if state.sinks.remove(&token).is_none() {
            return;
        }

        if state.sinks.is_empty() {
            for id in state.registrations.drain(..) {
                self.host.remove_listener(id);
            }
            log_debug!("last subscriber left; viewport listeners detached");
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.state().sinks.len()
    }

    fn broadcast(&self, event: HostEvent) {
        let sinks: Vec<Sink> = self.state().sinks.values().cloned().collect();
        for sink in sinks {
            sink(event);
        }
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ListenerSource {
    fn drop(&mut self) {
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        for id in state.registrations.drain(..) {
            self.host.remove_listener(id);
        }
    }
}
