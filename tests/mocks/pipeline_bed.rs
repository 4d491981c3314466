//! Pipeline test bed
//!
//! Owns the scripted tools, the recording transport, the rate limiter and a
//! temp root, and exposes them for assertions after a request has run.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::types::{ChatId, UserId};
use tempfile::TempDir;

use ttdl::core::{AccessGuard, RateLimiter};
use ttdl::download::{DeliveryOutcome, DeliveryPipeline, DeliveryRequest, MediaFormat, PipelineSettings};
use ttdl::telegram::HandlerDeps;
use ttdl::testing::{RecordingTransport, ScriptedExtractionTool, ScriptedTranscoder, MB};

/// Canonical TikTok video link used across scenarios
pub const LINK: &str = "https://www.tiktok.com/@dancer/video/7301234567890123456";

pub struct PipelineBed {
    pub pipeline: Arc<DeliveryPipeline>,
    pub extractor: Arc<ScriptedExtractionTool>,
    pub transcoder: Arc<ScriptedTranscoder>,
    pub transport: Arc<RecordingTransport>,
    pub rate_limiter: Arc<RateLimiter>,
    pub root: TempDir,
}

pub struct PipelineBedBuilder {
    extractor: ScriptedExtractionTool,
    transcoder: ScriptedTranscoder,
    transport: RecordingTransport,
    access: AccessGuard,
    rate_limit: u32,
    max_mb: u64,
    temp_subdir: Option<PathBuf>,
}

impl PipelineBed {
    pub fn builder(extractor: ScriptedExtractionTool) -> PipelineBedBuilder {
        PipelineBedBuilder {
            extractor,
            transcoder: ScriptedTranscoder::with_output_size(MB),
            transport: RecordingTransport::new(),
            access: AccessGuard::open(),
            rate_limit: 5,
            max_mb: 45,
            temp_subdir: None,
        }
    }

    pub fn request(&self, user: u64, format: MediaFormat) -> DeliveryRequest {
        DeliveryRequest::new(UserId(user), ChatId(user as i64), LINK, format)
    }

    pub async fn run(&self, user: u64, format: MediaFormat) -> DeliveryOutcome {
        self.pipeline.handle(&self.request(user, format)).await
    }

    /// Handler dependencies sharing this bed's pipeline and transport
    pub fn handler_deps(&self) -> HandlerDeps {
        HandlerDeps::new(self.pipeline.clone(), self.transport.clone())
    }

    /// Every file or directory left under the temp root
    pub fn leftovers(&self) -> Vec<PathBuf> {
        fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                out.push(path.clone());
                if path.is_dir() {
                    walk(&path, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self.root.path(), &mut out);
        out
    }
}

impl PipelineBedBuilder {
    pub fn transcoder(mut self, transcoder: ScriptedTranscoder) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn transport(mut self, transport: RecordingTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn admins(mut self, ids: &[u64]) -> Self {
        self.access = AccessGuard::new(ids.iter().copied().map(UserId).collect());
        self
    }

    pub fn rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = limit;
        self
    }

    pub fn max_mb(mut self, max_mb: u64) -> Self {
        self.max_mb = max_mb;
        self
    }

    /// Points the workspace root at `root/<subdir>` instead of `root`
    pub fn temp_subdir(mut self, subdir: impl Into<PathBuf>) -> Self {
        self.temp_subdir = Some(subdir.into());
        self
    }

    pub fn build(self) -> PipelineBed {
        let root = tempfile::tempdir().unwrap();
        let temp_dir = match &self.temp_subdir {
            Some(sub) => root.path().join(sub),
            None => root.path().to_path_buf(),
        };

        let extractor = Arc::new(self.extractor);
        let transcoder = Arc::new(self.transcoder);
        let transport = Arc::new(self.transport);
        let rate_limiter = Arc::new(RateLimiter::new(self.rate_limit));

        let pipeline = Arc::new(DeliveryPipeline::new(
            self.access,
            rate_limiter.clone(),
            extractor.clone(),
            transcoder.clone(),
            transport.clone(),
            PipelineSettings::builder()
                .max_size_bytes(self.max_mb * MB)
                .temp_dir(temp_dir)
                .build(),
        ));

        PipelineBed {
            pipeline,
            extractor,
            transcoder,
            transport,
            rate_limiter,
            root,
        }
    }
}
