//! Embassy async tasks
//!
//! `tick`, `sampler` and `fault` run on the high-priority interrupt
//! executor and preempt the console, which runs in thread mode.

pub mod console;
pub mod fault;
pub mod sampler;
pub mod tick;

pub use console::console_task;
pub use fault::fault_task;
pub use sampler::sampler_task;
pub use tick::tick_task;
