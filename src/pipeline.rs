use std::sync::Arc;

use serde::Serialize;

use crate::extract::{ExtractionError, Extractor};
use crate::llm::{CompletionProvider, CompletionRequest, DispatchError, Stage};
use crate::models::{AnalysisResult, ExtractedPage, RedesignResult, RoadmapResult};
use crate::normalize::{self, Canonical, NormalizeError};
use crate::prompts;

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("analysis failed: {0}")]
    Analysis(#[from] StageError),
}

// ── Stage runner ─────────────────────────────────────────────────────────────

/// Prompt, dispatch and normalize for each stage.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn CompletionProvider>,
}

impl Generator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn analyze(
        &self,
        page: &ExtractedPage,
        credential: &str,
    ) -> Result<AnalysisResult, StageError> {
        self.run_stage(Stage::Analyze, prompts::analyze_prompt(page), credential)
            .await
    }

    pub async fn redesign(
        &self,
        page: &ExtractedPage,
        custom_prompt: Option<&str>,
        credential: &str,
    ) -> Result<RedesignResult, StageError> {
        self.run_stage(
            Stage::Redesign,
            prompts::redesign_prompt(page, custom_prompt),
            credential,
        )
        .await
    }

    pub async fn roadmap(
        &self,
        page: &ExtractedPage,
        redesign: Option<&serde_json::Value>,
        credential: &str,
    ) -> Result<RoadmapResult, StageError> {
        self.run_stage(Stage::Roadmap, prompts::roadmap_prompt(page, redesign), credential)
            .await
    }

    async fn run_stage<T: Canonical>(
        &self,
        stage: Stage,
        prompt: String,
        credential: &str,
    ) -> Result<T, StageError> {
        let raw = self
            .provider
            .complete(CompletionRequest::for_stage(stage, prompt), credential)
            .await?;
        let result = normalize::normalize(&raw)?;
        tracing::debug!(%stage, "stage output normalized");
        Ok(result)
    }
}

// ── Run state ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Idle,
    Scraping,
    Analyzing,
    Complete,
}

impl RunStatus {
    /// Forward edges only; the error edge back to `Idle` goes through [`PipelineRun::fail`].
    fn can_advance_to(self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Idle, RunStatus::Scraping)
                | (RunStatus::Scraping, RunStatus::Analyzing)
                | (RunStatus::Analyzing, RunStatus::Complete)
        )
    }
}

/// One end-to-end invocation, owned by the request that started it.
#[derive(Debug, Serialize)]
pub struct PipelineRun {
    pub status: RunStatus,
    pub page: Option<ExtractedPage>,
    pub analysis: Option<AnalysisResult>,
    pub redesign: Option<RedesignResult>,
    pub roadmap: Option<RoadmapResult>,
    pub error: Option<String>,
    #[serde(skip)]
    pub failure: Option<RunError>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            status: RunStatus::Idle,
            page: None,
            analysis: None,
            redesign: None,
            roadmap: None,
            error: None,
            failure: None,
        }
    }

    fn advance(&mut self, next: RunStatus) {
        debug_assert!(self.status.can_advance_to(next), "{:?} -> {:?}", self.status, next);
        tracing::info!("run status {:?} -> {:?}", self.status, next);
        self.status = next;
    }

    fn fail(mut self, err: RunError) -> Self {
        tracing::warn!("run failed in {:?}: {}", self.status, err);
        self.status = RunStatus::Idle;
        self.analysis = None;
        self.redesign = None;
        self.roadmap = None;
        self.error = Some(err.to_string());
        self.failure = Some(err);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub custom_prompt: Option<String>,
    pub credential: String,
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Pipeline {
    extractor: Extractor,
    generator: Generator,
}

impl Pipeline {
    pub fn new(extractor: Extractor, generator: Generator) -> Self {
        Self { extractor, generator }
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Extract, then run the three stages concurrently.
    ///
    /// Always ends in `Complete` or in `Idle` with `error` set. Analysis is
    /// required; a failed redesign or roadmap only leaves that slot empty.
    pub async fn run(&self, url: &str, options: &RunOptions) -> PipelineRun {
        let mut run = PipelineRun::new();

        run.advance(RunStatus::Scraping);
        let page = match self.extractor.extract(url).await {
            Ok(page) => page,
            Err(e) => return run.fail(e.into()),
        };

        run.advance(RunStatus::Analyzing);
        let credential = options.credential.as_str();
        let (analysis, redesign, roadmap) = tokio::join!(
            self.generator.analyze(&page, credential),
            self.generator
                .redesign(&page, options.custom_prompt.as_deref(), credential),
            self.generator.roadmap(&page, None, credential),
        );
        run.page = Some(page);

        let analysis = match analysis {
            Ok(analysis) => analysis,
            Err(e) => return run.fail(e.into()),
        };
        run.analysis = Some(analysis);
        run.redesign = best_effort(Stage::Redesign, redesign);
        run.roadmap = best_effort(Stage::Roadmap, roadmap);

        run.advance(RunStatus::Complete);
        run
    }
}

fn best_effort<T>(stage: Stage, outcome: Result<T, StageError>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%stage, "stage failed, continuing without it: {}", e);
            None
        }
    }
}
