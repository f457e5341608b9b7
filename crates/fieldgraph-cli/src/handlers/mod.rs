//! Command handlers for CLI subcommands
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

mod fields;
mod infer;
mod join;
mod rename;
mod transform;
mod utils;
mod verify;

pub use fields::handle_fields;
pub use infer::handle_infer;
pub use join::handle_join;
pub use rename::handle_rename;
pub use transform::handle_transform;
pub use verify::handle_verify;
