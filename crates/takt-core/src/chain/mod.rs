mod runner;

pub use runner::{ChainRunner, ChainSession, ChainStatus};
