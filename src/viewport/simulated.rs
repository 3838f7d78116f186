use std::sync::{Mutex, MutexGuard, PoisonError};

use super::host::{HostEvent, HostListener, ListenerId, ListenerRegistry, ViewportHost};
use super::types::{ClientRect, ScrollPosition, ViewportSize};

#[derive(Debug, Clone, Copy)]
struct Geometry {
    window: ViewportSize,
    content: ViewportSize,
    scroll: ScrollPosition,
}

impl Geometry {
    /// The document always covers at least the viewport.
    fn document_size(&self) -> ViewportSize {
        ViewportSize::new(
            self.content.width.max(self.window.width),
            self.content.height.max(self.window.height),
        )
    }

    fn max_scroll(&self) -> ScrollPosition {
        let document = self.document_size();
        ScrollPosition::new(
            (document.height - self.window.height).max(0.0),
            (document.width - self.window.width).max(0.0),
        )
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        self.scroll.top = self.scroll.top.clamp(0.0, max.top);
        self.scroll.left = self.scroll.left.clamp(0.0, max.left);
    }
}

/// In-memory display surface.
///
/// Behaves like a browser window: scrolling is clamped to the document, window
/// changes fire the matching event, and registrations can be counted.
pub struct SimulatedHost {
    geometry: Mutex<Geometry>,
    listeners: ListenerRegistry,
}

impl SimulatedHost {
    pub fn new(width: f64, height: f64) -> Self {
        let window = ViewportSize::new(width, height);
        Self {
            geometry: Mutex::new(Geometry {
                window,
                content: window,
                scroll: ScrollPosition::default(),
            }),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Grows or shrinks the document content. Scroll is re-clamped.
    pub fn set_content_size(&self, width: f64, height: f64) {
        let mut geometry = self.geometry();
        geometry.content = ViewportSize::new(width, height);
        geometry.clamp_scroll();
    }

    pub fn scroll_to(&self, left: f64, top: f64) {
        let mut geometry = self.geometry();
        geometry.scroll = ScrollPosition::new(top, left);
        geometry.clamp_scroll();
    }

    /// Resizes the window and fires `resize`.
    pub fn resize(&self, width: f64, height: f64) {
        {
            let mut geometry = self.geometry();
            geometry.window = ViewportSize::new(width, height);
            geometry.clamp_scroll();
        }
        self.dispatch(HostEvent::Resize);
    }

    /// Swaps the window axes and fires `orientationchange`.
    pub fn rotate(&self) {
        {
            let mut geometry = self.geometry();
            let window = geometry.window;
            geometry.window = ViewportSize::new(window.height, window.width);
            geometry.clamp_scroll();
        }
        self.dispatch(HostEvent::OrientationChange);
    }

    /// Fires `event` without touching geometry. Returns the number of listeners reached.
    pub fn dispatch(&self, event: HostEvent) -> usize {
        self.listeners.dispatch(event)
    }

    /// Native registrations currently held for `event`.
    pub fn listener_count(&self, event: HostEvent) -> usize {
        self.listeners.count(event)
    }

    fn geometry(&self) -> MutexGuard<'_, Geometry> {
        self.geometry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ViewportHost for SimulatedHost {
    fn inner_size(&self) -> ViewportSize {
        self.geometry().window
    }

    fn document_rect(&self) -> ClientRect {
        let geometry = self.geometry();
        let document = geometry.document_size();
        ClientRect {
            top: -geometry.scroll.top,
            left: -geometry.scroll.left,
            width: document.width,
            height: document.height,
        }
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.geometry().scroll
    }

    fn add_listener(&self, event: HostEvent, listener: HostListener) -> ListenerId {
        self.listeners.add(event, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_is_clamped_to_document() {
        let host = SimulatedHost::new(800.0, 600.0);

        host.scroll_to(1500.0, 2000.0);
        assert_eq!(host.scroll_position(), ScrollPosition::default());

        host.set_content_size(6000.0, 6000.0);
        host.scroll_to(1500.0, 2000.0);
        assert_eq!(host.scroll_position(), ScrollPosition::new(2000.0, 1500.0));

        host.scroll_to(9000.0, -5.0);
        assert_eq!(host.scroll_position(), ScrollPosition::new(0.0, 5200.0));
    }

    #[test]
    fn shrinking_content_pulls_scroll_back() {
        let host = SimulatedHost::new(800.0, 600.0);
        host.set_content_size(6000.0, 6000.0);
        host.scroll_to(1500.0, 2000.0);

        host.set_content_size(1000.0, 1000.0);
        assert_eq!(host.scroll_position(), ScrollPosition::new(400.0, 200.0));
    }

    #[test]
    fn document_rect_moves_opposite_to_scroll() {
        let host = SimulatedHost::new(800.0, 600.0);
        host.set_content_size(6000.0, 6000.0);
        host.scroll_to(10.0, 20.0);

        let rect = host.document_rect();
        assert_eq!(rect.top, -20.0);
        assert_eq!(rect.left, -10.0);
        assert_eq!(rect.width, 6000.0);
    }

    #[test]
    fn rotate_swaps_axes() {
        let host = SimulatedHost::new(800.0, 600.0);
        host.rotate();
        assert_eq!(host.inner_size(), ViewportSize::new(600.0, 800.0));
    }
}
