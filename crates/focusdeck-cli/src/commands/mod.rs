pub mod config;
pub mod progress;
pub mod run;
pub mod sessions;
pub mod stats;
