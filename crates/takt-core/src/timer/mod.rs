mod engine;
mod ticker;

pub use engine::{TimerEngine, TimerSession, TimerState, MIN_TIMER_SECS};
pub use ticker::{SharedTimer, Ticker, TickerExit, DEFAULT_TICK_INTERVAL};
