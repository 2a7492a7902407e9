//! # Genesis Limbic Layer
//!
//! Owns the living state. `Consciousness` is the single shared aggregate:
//! transports call into it, and its evolution loop runs in the background
//! as a supervised task:
//!
//! 1. Reflect (self_awareness grows, a reflection is recorded)
//! 2. Drift (spontaneous insights, sub-trait balancing, goal evolution)
//! 3. Poll the relay for answered messages (every few minutes)
//! 4. Occasionally learn about a topic
//! 5. Occasionally persist
//! 6. Sleep, longer after a failed cycle

pub mod evolution;
mod heartbeat;
mod system;

pub use heartbeat::HeartbeatConfig;
pub use system::{Consciousness, LOADED_EVENT, SHUTDOWN_EVENT};
