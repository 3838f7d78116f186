use std::{sync::Arc, time::Duration};

use tokio::runtime::Handle;

use super::{
    change::ViewportChanges,
    host::ViewportHost,
    source::ListenerSource,
    types::{ScrollPosition, ViewportRect, ViewportSize},
};

/// Debounce used by [`ViewportRuler::change_default`].
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(20);

/// Measures the viewport of a [`ViewportHost`] and reports when it changes.
///
/// Queries always read live host state; nothing is cached. Clones share the
/// same host listeners.
#[derive(Clone)]
pub struct ViewportRuler {
    host: Arc<dyn ViewportHost>,
    source: Arc<ListenerSource>,
    runtime: Option<Handle>,
}

impl ViewportRuler {
    pub fn new<H>(host: H) -> Self
    where
        H: ViewportHost + 'static,
    {
        let host: Arc<dyn ViewportHost> = Arc::new(host);
        Self {
            source: ListenerSource::new(Arc::clone(&host)),
            host,
            runtime: None,
        }
    }

    /// Runs debounce timers on `handle` instead of the subscriber's runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn viewport_size(&self) -> ViewportSize {
        self.host.inner_size()
    }

    /// Visible rectangle in document coordinates.
    pub fn viewport_rect(&self) -> ViewportRect {
        ViewportRect::from_scroll(self.viewport_scroll_position(), self.viewport_size())
    }

    /// Scroll offset of the document.
    ///
    /// The document root's client rect is preferred over the window offsets so
    /// the result stays in client coordinates when the page is pinch-zoomed.
    pub fn viewport_scroll_position(&self) -> ScrollPosition {
        let document = self.host.document_rect();
        let fallback = self.host.scroll_position();

        ScrollPosition {
            top: offset_or(-document.top, fallback.top),
            left: offset_or(-document.left, fallback.left),
        }
    }

    /// Stream of debounced resize/orientation notifications.
    pub fn change(&self, debounce: Duration) -> ViewportChanges {
        ViewportChanges::new(Arc::clone(&self.source), debounce, self.runtime.clone())
    }

    pub fn change_default(&self) -> ViewportChanges {
        self.change(DEFAULT_DEBOUNCE)
    }

    /// Live subscriptions across every stream of this ruler.
    pub fn subscriber_count(&self) -> usize {
        self.source.subscriber_count()
    }
}

fn offset_or(primary: f64, fallback: f64) -> f64 {
    if primary != 0.0 && !primary.is_nan() {
        primary
    } else if fallback.is_nan() {
        0.0
    } else {
        fallback
    }
}
