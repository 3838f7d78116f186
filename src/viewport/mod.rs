pub mod change;
pub mod host;
pub mod ruler;
pub mod simulated;
mod source;
pub mod terminal;
pub mod types;

pub use change::{ChangeSubscription, ViewportChanges};
pub use host::{HostEvent, HostListener, ListenerId, ListenerRegistry, ViewportHost};
pub use ruler::{ViewportRuler, DEFAULT_DEBOUNCE};
pub use simulated::SimulatedHost;
pub use terminal::TerminalHost;
pub use types::{ChangeNotification, ClientRect, ScrollPosition, ViewportRect, ViewportSize};

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error("debounced viewport changes need a tokio runtime")]
    NoRuntime,
}
