//! # Host Hooks
//!
//! The host-facing side of the multiplexer: the hook contract, the factory
//! pair installed into it, and the guard that installs that pair once.

pub mod builtin;
pub mod host;
pub mod installer;
pub mod multiplexer;

pub use builtin::{JsonDecoder, LocalFileHandler, PlainTextDecoder};
pub use host::{ContentHandlerFactory, HostRuntime, InProcessHost, SchemeHandlerFactory};
pub use installer::{GlobalHookInstaller, InstallState};
pub use multiplexer::HandlerMultiplexer;
