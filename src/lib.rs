#![doc = include_str!("../README.md")]

pub mod config;
pub mod dcp;
pub mod error;
pub mod lotd;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod schedule;
pub mod smgt;
pub mod trace_log;

pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use model::{CommCostTable, Dag, Task, Vm};
pub use pipeline::schedule;
pub use schedule::Schedule;
