//! Script Bridges
//!
//! Global tables installed into a discovery script's interpreter:
//! - `sd.*` publishes nodes and items into the instance catalog
//! - `msg.*` writes into the instance journal

pub mod msg_table;
pub mod sd_table;

pub use msg_table::create_msg_table;
pub use sd_table::create_sd_table;
