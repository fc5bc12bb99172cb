pub mod algorithm;
pub mod channel;
pub mod common;
pub mod config;
pub mod model;
pub mod problem;
pub mod solver;
pub mod stat;
