pub mod chain;
pub mod config;
pub mod habit;
pub mod link;
pub mod notify;
pub mod pack;
pub mod stats;
pub mod suggest;
pub mod timer;
