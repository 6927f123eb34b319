//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements     | Connects to                     |
//! |---------------|----------------|---------------------------------|
//! | `json_config` | ConfigPort     | JSON file on disk               |
//! | `log_sink`    | EventSink      | `log` facade (console)          |
//! | `mailbox`     | CommandSource  | Addon mailbox text file         |
//! | `sim_link`    | DeviceLink     | In-process simulated server     |

pub mod json_config;
pub mod log_sink;
pub mod mailbox;
pub mod sim_link;
