// Scheduler module for cycle-based job trigger dispatch

pub mod engine;

pub use engine::{
    deploy_due_triggers, prediction_due, validation_due, CycleScheduler, SchedulerConfig,
};
