//! Shared wiring for pipeline integration tests
//!
//! Builds a [`DeliveryPipeline`] from the scripted doubles in
//! `ttdl::testing` with an isolated temp root per test.

pub mod pipeline_bed;

pub use pipeline_bed::{PipelineBed, LINK};
pub use ttdl::testing::{RecordingTransport, ScriptedExtractionTool, ScriptedTranscoder, MB};
