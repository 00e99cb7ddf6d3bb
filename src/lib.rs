#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod harvest;
pub mod host;
pub mod logging;
pub mod merge;
pub mod nav;
