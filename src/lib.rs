pub mod app;
pub mod auth;
pub mod callback;
pub mod config;
pub mod console;
pub mod logging;
pub mod prefs;
pub mod terminal;
pub mod ui;
pub mod util;
pub mod validate;

#[cfg(test)]
mod test_support;
