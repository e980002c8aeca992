//! Application layer: link construction, selection handling, and the copy command.

pub mod command;
pub mod link;
pub mod selection;
