pub mod batch;
pub mod config_loader;
pub mod key_syntax;
pub mod log_config;
pub mod numeric;
pub mod output;
