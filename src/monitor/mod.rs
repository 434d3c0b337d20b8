//! The monitor module contains the threshold evaluator and the monitoring slot
//! engine.

pub mod engine;
pub mod slot;
pub mod threshold;

pub use engine::{AlarmEvent, MonitorEngine, SlotOutcome, SlotReport};
pub use slot::{MonitorSlot, SlotConfig};
pub use threshold::{evaluate, Alarm, AlarmSet, Evaluation, ThresholdFlags, Thresholds};
