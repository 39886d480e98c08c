//! Dataset assembly
//!
//! Feeds each unit (a function record or a requirement) through the
//! generator, recovers a structured object from the output and appends one
//! sample per unit to a JSONL sink, in input order.

mod assembler;
mod sample;
mod writer;

pub use assembler::{AssemblyReport, DatasetAssembler, Outcome};
pub use sample::{DesignSample, QaSample, Sample, Unit, ERROR_MARKER};
pub use writer::{JsonlWriter, SampleSink};
