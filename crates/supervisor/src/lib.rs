//! Host side of the function bridge protocol.
//!
//! The supervisor spawns bridge processes, writes one request line per
//! invocation to a bridge's stdin and reads its stdout until the result frame
//! arrives, passing every other line on as handler diagnostics. A bridge that
//! exits instead of answering is classified by its exit status and the
//! failure report it left on stderr.
//!
//! * [`BridgeProcess`]: one child process, one invocation at a time.
//! * [`BridgePool`]: processes keyed by function, reused while idle and
//!   reaped after [`SupervisorConfig::idle_time`].

mod command;
mod config;
mod error;
mod pool;
mod process;
mod stderr;

pub use command::BridgeCommand;
pub use config::SupervisorConfig;
pub use error::{BridgeFailure, ExitKind, Result, SupervisorError};
pub use pool::{BridgePool, PooledBridge};
pub use process::{BridgeProcess, Invocation};
