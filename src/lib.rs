pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod model;
pub mod page;
pub mod render;
pub mod session;

#[cfg(test)]
mod tests;
