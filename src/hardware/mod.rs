//! Hardware side of the assistant: the serial line protocol, the snapshot
//! record shared with the dialogue loop, and the watcher task that keeps it
//! current.

pub mod protocol;
pub mod snapshot;
pub mod watcher;

pub use protocol::{parse_line, HardwareLine, LineDecoder, SensorReading, Temperature};
pub use snapshot::HardwareSnapshot;
pub use watcher::{
    FileSnapshotSource, HardwareWatcher, LineSnapshotSource, LossyLines, SnapshotSource,
};
