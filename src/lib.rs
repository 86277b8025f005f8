pub mod bridge;
pub mod channel;
pub mod config;
pub mod ffi;
pub mod outcome;
pub mod scanner;

pub(crate) mod logging;

uniffi::setup_scaffolding!();
