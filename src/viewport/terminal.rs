use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use crossterm::{event, terminal};
use tokio_util::sync::CancellationToken;

use super::host::{HostEvent, HostListener, ListenerId, ListenerRegistry, ViewportHost};
use super::types::{ClientRect, ScrollPosition, ViewportSize};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Shared {
    size: Mutex<ViewportSize>,
    listeners: ListenerRegistry,
}

impl Shared {
    fn new(size: ViewportSize) -> Self {
        Self {
            size: Mutex::new(size),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Applies one terminal event. Returns the listeners reached by a resize.
    fn handle_event(&self, event: event::Event) -> usize {
        match event {
            event::Event::Resize(cols, rows) => {
                self.set_size(cols, rows);
                let reached = self.listeners.dispatch(HostEvent::Resize);
                log_debug!("terminal resized to {}x{} ({} listener(s))", cols, rows, reached);
                reached
            }
            _ => 0,
        }
    }

    fn size(&self) -> ViewportSize {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_size(&self, cols: u16, rows: u16) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) =
            ViewportSize::new(f64::from(cols), f64::from(rows));
    }
}

/// The controlling terminal as a display surface, measured in cells.
///
/// A background thread pumps crossterm events and turns terminal resizes into
/// `resize` events. The terminal never scrolls, so the document is exactly the
/// viewport.
pub struct TerminalHost {
    shared: Arc<Shared>,
    cancel_token: CancellationToken,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalHost {
    pub fn spawn() -> Result<Self> {
        let (cols, rows) = terminal::size().context("failed to read terminal size")?;
        let shared = Arc::new(Shared::new(ViewportSize::new(f64::from(cols), f64::from(rows))));

        let cancel_token = CancellationToken::new();
        let pump = thread::Builder::new()
            .name("viewport-terminal".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                let token = cancel_token.clone();
                move || event_pump(shared, token)
            })
            .context("failed to start terminal event pump")?;

        log_info!("terminal host started at {}x{} cells", cols, rows);

        Ok(Self {
            shared,
            cancel_token,
            pump: Mutex::new(Some(pump)),
        })
    }

    /// Stops the event pump and waits for it. Safe to call more than once.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();

        let handle = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log_warn!("terminal event pump panicked");
            }
        }
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ViewportHost for TerminalHost {
    fn inner_size(&self) -> ViewportSize {
        self.shared.size()
    }

    fn document_rect(&self) -> ClientRect {
        let size = self.shared.size();
        ClientRect {
            top: 0.0,
            left: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    fn scroll_position(&self) -> ScrollPosition {
        ScrollPosition::default()
    }

    fn add_listener(&self, event: HostEvent, listener: HostListener) -> ListenerId {
        self.shared.listeners.add(event, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }
}

fn event_pump(shared: Arc<Shared>, cancel_token: CancellationToken) {
    while !cancel_token.is_cancelled() {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(event) => {
                    shared.handle_event(event);
                }
                Err(err) => {
                    log_warn!("terminal event read failed: {err}");
                    break;
                }
            },
            Ok(false) => {}
            Err(err) => {
                log_warn!("terminal event poll failed: {err}");
                break;
            }
        }
    }
    log_debug!("terminal event pump stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn resize_events_update_size_and_notify() {
        let shared = Shared::new(ViewportSize::new(80.0, 24.0));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        shared.listeners.add(
            HostEvent::Resize,
            Arc::new(move |_: HostEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(shared.handle_event(event::Event::Resize(120, 40)), 1);
        assert_eq!(shared.size(), ViewportSize::new(120.0, 40.0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn other_events_are_ignored() {
        let shared = Shared::new(ViewportSize::new(80.0, 24.0));
        shared.listeners.add(HostEvent::Resize, Arc::new(|_: HostEvent| {}));

        assert_eq!(shared.handle_event(event::Event::FocusGained), 0);
        assert_eq!(shared.size(), ViewportSize::new(80.0, 24.0));
    }
}
