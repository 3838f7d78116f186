//! Viewport geometry for a display surface, with debounced change
//! notifications, and a launcher for the TypeScript compilers.

pub mod compile;
pub mod settings;
pub mod utils;
pub mod viewport;

pub use compile::{ts_compile, CompileCommand, CompileError, Compiler};
pub use settings::{CompilerSettings, SettingsStore, WatchSettings};
pub use utils::logging::init_logging;
pub use viewport::{
    ChangeNotification, ChangeSubscription, HostEvent, ScrollPosition, SimulatedHost,
    TerminalHost, ViewportChanges, ViewportError, ViewportHost, ViewportRect, ViewportRuler,
    ViewportSize,
};
