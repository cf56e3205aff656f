//! Courier engine: runs the core state machine against a live host.
mod dispatcher;
mod engine;
mod host;
mod listener;
mod status;
mod supervisor;

pub use dispatcher::Dispatcher;
pub use engine::{EngineConfig, EngineError, EngineHandle, EnqueueError, JobHandle};
pub use host::{Host, HostError, LaunchError, UiEvent, UiEventKind, UiEventStream};
pub use status::{ChannelStatusSink, StatusSink};
