#![forbid(unsafe_code)]

pub mod config;
pub mod model;
pub mod time;

pub use config::QuizConfig;
pub use time::Clock;
