//! Background runtime: the executor worker and the channels that feed it.

pub mod channels;
pub mod workers;

pub use channels::{ActionOutput, ActionRequest, Channels};
