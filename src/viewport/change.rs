use std::{sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
    time::{self, Instant},
};

use super::{
    host::HostEvent,
    source::{ListenerSource, SinkToken},
    types::ChangeNotification,
    ViewportError,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Lazy change stream returned by [`ViewportRuler::change`](super::ViewportRuler::change).
///
/// Nothing is attached to the host until [`subscribe`](Self::subscribe) is
/// called. The stream can be subscribed any number of times, concurrently or
/// after earlier subscriptions ended.
#[derive(Clone)]
pub struct ViewportChanges {
    source: Arc<ListenerSource>,
    debounce: Duration,
    runtime: Option<Handle>,
}

impl ViewportChanges {
    pub(crate) fn new(source: Arc<ListenerSource>, debounce: Duration, runtime: Option<Handle>) -> Self {
        Self {
            source,
            debounce,
            runtime,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Starts receiving notifications.
    ///
    /// With a zero debounce every trigger is delivered during the host's
    /// dispatch. Otherwise a timer task is spawned on the ruler's runtime (or
    /// the current one) and a burst of triggers yields one notification.
    pub fn subscribe(&self) -> Result<ChangeSubscription, ViewportError> {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        if self.debounce.is_zero() {
            let token = self.source.attach(Arc::new(move |_: HostEvent| {
                let _ = notify_tx.send(ChangeNotification);
            }));
            return Ok(ChangeSubscription {
                receiver: notify_rx,
                source: Arc::clone(&self.source),
                token,
                timer: None,
            });
        }

        let runtime = match &self.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| ViewportError::NoRuntime)?,
        };

        // Only the latest trigger time matters, so a watch slot replaces a queue.
        let (trigger_tx, trigger_rx) = watch::channel(None);
        let timer = runtime.spawn(debounce_loop(trigger_rx, notify_tx, self.debounce));
        let token = self.source.attach(Arc::new(move |_: HostEvent| {
            // The window starts at the host event, not when the timer task wakes.
            let _ = trigger_tx.send_replace(Some(Instant::now()));
        }));

        Ok(ChangeSubscription {
            receiver: notify_rx,
            source: Arc::clone(&self.source),
            token,
            timer: Some(timer),
        })
    }
}

/// One subscriber of a [`ViewportChanges`] stream.
///
/// Dropping it unsubscribes: the host listeners are released once no other
/// subscription holds them, and a pending debounced notification is discarded.
pub struct ChangeSubscription {
    receiver: UnboundedReceiver<ChangeNotification>,
    source: Arc<ListenerSource>,
    token: SinkToken,
    timer: Option<JoinHandle<()>>,
}

impl ChangeSubscription {
    /// Waits for the next notification.
    pub async fn next(&mut self) -> Option<ChangeNotification> {
        self.receiver.recv().await
    }

    /// Takes an already delivered notification, if any.
    pub fn try_next(&mut self) -> Option<ChangeNotification> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.source.detach(self.token);
    }
}

async fn debounce_loop(
    mut triggers: watch::Receiver<Option<Instant>>,
    notify: UnboundedSender<ChangeNotification>,
    window: Duration,
) {
    while triggers.changed().await.is_ok() {
        let Some(first) = *triggers.borrow_and_update() else {
            continue;
        };
        let mut last = first;
        let sleep = time::sleep_until(first + window);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,
                changed = triggers.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if let Some(at) = *triggers.borrow_and_update() {
                        last = at;
                        sleep.as_mut().reset(at + window);
                    }
                }
            }
        }

        log_debug!(
            "viewport change settled {:?} after the burst began (window {:?})",
            last.saturating_duration_since(first) + window,
            window
        );

        if notify.send(ChangeNotification).is_err() {
            break;
        }
    }
}
