//! Batches, text encoding, and split naming.

pub mod batch;
pub mod encoder;
pub mod splits;

pub use batch::{Features, StepOutput, Targets, TextBatch};
pub use encoder::{EncodedText, HfTextEncoder, TextEncoder};
pub use splits::{NamedSplits, SplitSource, split_suffix};
