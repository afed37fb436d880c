//! Command implementations for OxiGz CLI.

pub mod cat;
pub mod extract;
pub mod info;

pub use cat::cmd_cat;
pub use extract::cmd_extract;
pub use info::cmd_info;
