use serde::{Deserialize, Serialize};

/// Size of the visible viewport at query time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Scroll offset of the scroll root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPosition {
    pub top: f64,
    pub left: f64,
}

impl ScrollPosition {
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Visible viewport rectangle in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl ViewportRect {
    /// Rectangle of `size` whose origin sits at the scroll offset.
    pub fn from_scroll(scroll: ScrollPosition, size: ViewportSize) -> Self {
        Self {
            top: scroll.top,
            left: scroll.left,
            bottom: scroll.top + size.height,
            right: scroll.left + size.width,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Bounding rectangle of the document root in client coordinates.
///
/// A document scrolled down by `y` reports `top == -y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// "Something about the viewport changed; re-query if you care."
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeNotification;
