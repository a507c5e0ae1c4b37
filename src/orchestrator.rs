//! Pipeline orchestrator for VidQuery.
//!
//! Wires the transcript fetcher, the retriever cache and the question answerer
//! together for one request, under one deadline.

use crate::cache::RetrieverCache;
use crate::chunking::{ChunkingConfig, TextSplitter};
use crate::config::{Prompts, Settings};
use crate::deadline::Deadline;
use crate::embedding::create_embedder;
use crate::error::{Result, VidQueryError};
use crate::index::Indexer;
use crate::llm::create_model;
use crate::rag::{Answer, QuestionAnswerer};
use crate::transcript::{normalize_video_id, Transcript, TranscriptFetcher, YoutubeTranscriptSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The main orchestrator for the VidQuery pipeline.
pub struct Orchestrator {
    fetcher: TranscriptFetcher,
    cache: Arc<RetrieverCache>,
    answerer: QuestionAnswerer,
    request_timeout: Option<Duration>,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube and the configured providers.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let source = Arc::new(YoutubeTranscriptSource::new(Duration::from_secs(
            settings.transcript.http_timeout_seconds,
        ))?);
        let fetcher = TranscriptFetcher::new(source, settings.transcript.languages.clone());

        let embedder = create_embedder(settings)?;
        let splitter = TextSplitter::new(ChunkingConfig::from(&settings.chunking))?;
        let indexer = Arc::new(Indexer::new(splitter, embedder));
        let cache = Arc::new(RetrieverCache::from_settings(indexer, &settings.cache));

        let model = create_model(settings)?;
        info!(
            "Using {} embeddings and model {}",
            settings.embedding.provider,
            model.model_name()
        );
        let answerer = QuestionAnswerer::new(cache.clone(), model, settings.rag.top_k).with_prompts(prompts);

        Ok(Self::with_components(
            fetcher,
            answerer,
            settings.server.request_timeout(),
        ))
    }

    /// Assemble an orchestrator from prebuilt parts.
    ///
    /// The answerer's cache is the one the orchestrator fills.
    pub fn with_components(
        fetcher: TranscriptFetcher,
        answerer: QuestionAnswerer,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            fetcher,
            cache: answerer.cache().clone(),
            answerer,
            request_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<RetrieverCache> {
        &self.cache
    }

    /// Answer a question about a video.
    ///
    /// The transcript is fetched and indexed only when no index is cached for
    /// the video. Each stage runs under what is left of the request deadline.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, video: &str, question: &str) -> Result<Answer> {
        let video_id = normalize_video_id(video);
        if video_id.is_empty() {
            return Err(VidQueryError::InvalidInput("video_id must not be empty".to_string()));
        }
        if question.trim().is_empty() {
            return Err(VidQueryError::InvalidInput("question must not be empty".to_string()));
        }

        let deadline = Deadline::after(self.request_timeout);

        let fetcher = &self.fetcher;
        let indexer = self.cache.indexer();
        let id = video_id.as_str();

        let index = self
            .cache
            .get_or_try_build(id, move || async move {
                let transcript = deadline.run("transcript fetch", fetcher.fetch(id)).await?;
                deadline
                    .run("index build", indexer.index_transcript(&transcript))
                    .await
            })
            .await?;

        deadline
            .run("answer generation", self.answerer.answer_with_index(&index, question))
            .await
    }

    /// Fetch the transcript of a video without indexing it.
    #[instrument(skip(self))]
    pub async fn transcript(&self, video: &str) -> Result<Transcript> {
        let video_id = normalize_video_id(video);
        if video_id.is_empty() {
            return Err(VidQueryError::InvalidInput("video_id must not be empty".to_string()));
        }

        Deadline::after(self.request_timeout)
            .run("transcript fetch", self.fetcher.fetch(&video_id))
            .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Orchestrators over in-memory providers.

    use super::*;
    use crate::index::testing::CountingEmbedder;
    use crate::rag::testing::ScriptedModel;
    use crate::transcript::testing::FakeTranscriptSource;

    /// The handles a test needs to observe an orchestrator.
    pub struct Harness {
        pub orchestrator: Orchestrator,
        pub source: Arc<FakeTranscriptSource>,
        pub embedder: Arc<CountingEmbedder>,
        pub model: Arc<ScriptedModel>,
    }

    pub fn harness(
        source: FakeTranscriptSource,
        embedder: CountingEmbedder,
        model: ScriptedModel,
        request_timeout: Option<Duration>,
    ) -> Harness {
        let source = Arc::new(source);
        let embedder = Arc::new(embedder);
        let model = Arc::new(model);

        let fetcher = TranscriptFetcher::new(source.clone(), vec!["hi".to_string(), "en".to_string()]);
        let indexer = Arc::new(Indexer::new(TextSplitter::default(), embedder.clone()));
        let cache = Arc::new(RetrieverCache::new(indexer, 4, None));
        let answerer = QuestionAnswerer::new(cache, model.clone(), 3);

        Harness {
            orchestrator: Orchestrator::with_components(fetcher, answerer, request_timeout),
            source,
            embedder,
            model,
        }
    }

    /// A source knowing `abc123` (English) and `locked` (transcripts disabled).
    pub fn sample_source() -> FakeTranscriptSource {
        FakeTranscriptSource::new()
            .with_transcript(
                "abc123",
                "en",
                &[
                    "Welcome to the channel.",
                    "Today we look at how volcanoes form.",
                    "Magma rises through cracks in the crust.",
                    "When pressure builds up, the volcano erupts.",
                ],
            )
            .with_disabled("locked")
    }
}
