//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                   |
//! |-------------|----------------|-------------------------------|
//! | `display`   | StatusDisplay  | Log output                    |
//! | `http_sink` | TelemetrySink  | Line-protocol HTTP write API  |
//! | `log_sink`  | EventSink      | Log output                    |
//! | `time`      | Clock          | System clock / manual clock   |

pub mod display;
#[cfg(feature = "http")]
pub mod http_sink;
pub mod log_sink;
pub mod time;
