//! Library side of the `panelmed` command: argument definitions, settings
//! files, logging setup and the analysis pipeline behind each command.

pub mod cli;
pub mod config;
pub mod logging;
pub mod pipeline;
