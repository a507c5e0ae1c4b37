//! Grounded answer generation.

use super::context::format_context_for_prompt;
use crate::cache::RetrieverCache;
use crate::config::Prompts;
use crate::error::Result;
use crate::index::{ScoredChunk, VectorIndex};
use crate::llm::LanguageModel;
use crate::transcript::Transcript;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A bulleted answer and the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// One bullet per line, each starting with `*`.
    pub text: String,
    /// Retrieved chunks, most similar first.
    pub sources: Vec<ScoredChunk>,
}

/// Answers questions about a video from its transcript.
pub struct QuestionAnswerer {
    cache: Arc<RetrieverCache>,
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    top_k: usize,
}

impl QuestionAnswerer {
    pub fn new(cache: Arc<RetrieverCache>, model: Arc<dyn LanguageModel>, top_k: usize) -> Self {
        Self {
            cache,
            model,
            prompts: Prompts::default(),
            top_k: top_k.max(1),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn cache(&self) -> &Arc<RetrieverCache> {
        &self.cache
    }

    /// Answer a question about a video, indexing its transcript on first use.
    #[instrument(skip(self, transcript, question))]
    pub async fn answer(&self, video_id: &str, transcript: &Transcript, question: &str) -> Result<Answer> {
        let index = self.cache.get_or_build(video_id, transcript).await?;
        self.answer_with_index(&index, question).await
    }

    /// Answer a question against an already built index.
    #[instrument(skip(self, index), fields(video_id = %index.video_id()))]
    pub async fn answer_with_index(&self, index: &VectorIndex, question: &str) -> Result<Answer> {
        let sources = index.search(question, self.top_k).await?;
        debug!("Retrieved {} chunks", sources.len());

        let context = format_context_for_prompt(&sources);
        let prompt = self.prompts.render_answer(&context, question);

        info!("Asking {} about {}", self.model.model_name(), index.video_id());
        let raw = self.model.complete(&prompt).await?;

        Ok(Answer {
            text: format_bullets(&raw),
            sources,
        })
    }
}

/// Normalize a model response into bullet lines.
///
/// Blank lines are dropped, every line is trimmed, and lines that do not start
/// with `*` get a `* ` prefix.
pub fn format_bullets(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('*') {
                line.to_string()
            } else {
                format!("* {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted language model for tests.

    use super::*;
    use crate::error::VidQueryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed response and records every prompt it receives.
    pub struct ScriptedModel {
        reply: std::result::Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(VidQueryError::LanguageModel)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::chunking::TextSplitter;
    use crate::embedding::HashingEmbedder;
    use crate::error::VidQueryError;
    use crate::index::Indexer;

    fn answerer(model: Arc<ScriptedModel>) -> QuestionAnswerer {
        let indexer = Arc::new(Indexer::new(TextSplitter::default(), Arc::new(HashingEmbedder::default())));
        let cache = Arc::new(RetrieverCache::new(indexer, 8, None));
        QuestionAnswerer::new(cache, model, 3)
    }

    fn long_transcript() -> Transcript {
        let topics = ["volcanoes erupt with molten lava", "the stock market fell sharply", "penguins live in antarctica"];
        let text = (0..60)
            .map(|i| format!("Part {} explains that {}.", i, topics[i % 3]))
            .collect::<Vec<_>>()
            .join(" ");
        Transcript::new("vid", "en", text)
    }

    #[test]
    fn test_format_bullets() {
        assert_eq!(
            format_bullets("Line one\n* Line two\n\nLine three"),
            "* Line one\n* Line two\n* Line three"
        );
    }

    #[test]
    fn test_format_bullets_trims_and_drops_blank_lines() {
        assert_eq!(
            format_bullets("  \r\n   indented\r\n\t* bullet  \n   \n"),
            "* indented\n* bullet"
        );
        assert_eq!(format_bullets(""), "");
        assert_eq!(format_bullets("*already"), "*already");
    }

    #[tokio::test]
    async fn test_answer_renders_prompt_with_context_and_question() {
        let model = Arc::new(ScriptedModel::replying("Penguins live in Antarctica.\n\n* They swim."));
        let answerer = answerer(model.clone());

        let answer = answerer
            .answer("vid", &long_transcript(), "Where do penguins live?")
            .await
            .unwrap();

        assert_eq!(answer.text, "* Penguins live in Antarctica.\n* They swim.");
        assert!(!answer.sources.is_empty() && answer.sources.len() <= 3);

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Question:\nWhere do penguins live?"));
        assert!(prompt.contains("Make sure each bullet point starts with '*'."));
        let context = format_context_for_prompt(&answer.sources);
        assert!(prompt.contains(&context));
    }

    #[tokio::test]
    async fn test_repeated_questions_reuse_index() {
        let model = Arc::new(ScriptedModel::replying("ok"));
        let answerer = answerer(model.clone());
        let transcript = long_transcript();

        answerer.answer("vid", &transcript, "first?").await.unwrap();
        answerer.answer("vid", &transcript, "second?").await.unwrap();

        assert_eq!(answerer.cache().stats().builds, 1);
        assert_eq!(model.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::failing("quota exceeded"));
        let answerer = answerer(model);

        let err = answerer
            .answer("vid", &long_transcript(), "anything?")
            .await
            .unwrap_err();
        assert!(matches!(err, VidQueryError::LanguageModel(_)));
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("quota exceeded"));
        // The index survives a model failure.
        assert!(answerer.cache().contains("vid"));
    }
}
