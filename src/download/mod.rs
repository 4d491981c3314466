//! Download management and delivery

pub mod artifact;
pub mod compressor;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod send;
pub mod workspace;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use artifact::{MediaArtifact, MediaFormat, SourceVariant};
pub use compressor::Compressor;
pub use error::{DeliveryError, ExtractionError, PipelineError};
pub use extractor::{ExtractedMedia, ExtractionTool, Extractor};
pub use pipeline::{DeliveryOutcome, DeliveryPipeline, DeliveryRequest, PipelineSettings};
pub use send::Transport;
pub use workspace::RequestWorkspace;
pub use ytdlp::YtDlpTool;
