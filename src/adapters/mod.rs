//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                   | Connects to              |
//! |------------|------------------------------|--------------------------|
//! | `log_sink` | EventSink                    | Serial / stderr log      |
//! | `sim`      | SetpointAdc, BackupRegisters | In-memory board + file   |
//! |            | embedded-hal pins            |                          |
//! | `time`     | loop clock                   | Host monotonic timer     |

pub mod log_sink;
pub mod sim;
pub mod time;
