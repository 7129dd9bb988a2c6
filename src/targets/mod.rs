//! Target implementations

pub mod memory;
#[cfg(any(feature = "console", feature = "file", feature = "network"))]
pub(crate) mod worker;

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "network")]
pub mod network;

pub use memory::{MemoryTarget, SharedEntries};

#[cfg(feature = "console")]
pub use console::{ConsoleStream, ConsoleTarget};
#[cfg(feature = "file")]
pub use file::FileTarget;
#[cfg(feature = "network")]
pub use network::{NetworkTarget, Transport};

pub use crate::core::{Filter, Record, Target};
