pub mod assume;
pub mod completions;
pub mod config;
pub mod env;
pub mod profile;
pub mod release;
pub mod status;
pub mod switch;
