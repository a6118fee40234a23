pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;

#[cfg(test)]
mod tests;
