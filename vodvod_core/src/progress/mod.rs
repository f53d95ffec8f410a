pub mod notifier;
pub mod observer;
pub mod sink;
pub mod snapshot;

pub use notifier::ProgressNotifier;
pub use observer::ProgressObserver;
pub use sink::EventSink;
pub use snapshot::{format_bytes, ProgressSnapshot};
