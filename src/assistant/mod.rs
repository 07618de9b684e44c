// Assistant module
// Language-model boundary and the answer, summary and quiz flows built on retrieval


pub mod prompts;

use clap::ValueEnum;
use itertools::Itertools;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::retrieval::RetrievalService;
use crate::store::UserId;

pub const DEFAULT_QUIZ_COUNT: usize = 5;

/// Maps a prompt to a completion. Transient failures are the caller's to retry.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    #[inline]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    /// Position of the chunk the question was generated from
    pub chunk_index: usize,
}

/// Questions generated for one chunk, and how many were asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CachedQuestions {
    questions: Vec<String>,
    requested: usize,
}

/// Questions already generated for each chunk of the current document.
///
/// Slots line up with chunk positions. A slot is regenerated when a quiz asks
/// for more questions than the slot was generated with. A failed slot stays
/// empty and is retried on the next quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionCache {
    per_chunk: Vec<CachedQuestions>,
}

impl QuestionCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn questions_for(&self, chunk_index: usize) -> &[String] {
        self.per_chunk
            .get(chunk_index)
            .map_or(&[], |slot| slot.questions.as_slice())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.per_chunk.iter().all(|slot| slot.questions.is_empty())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.per_chunk.clear();
    }

    fn align_to(&mut self, chunk_count: usize) {
        if self.per_chunk.len() != chunk_count {
            if !self.per_chunk.is_empty() {
                debug!(
                    "Question cache covers {} chunks, document has {}; resetting",
                    self.per_chunk.len(),
                    chunk_count
                );
            }
            self.per_chunk = vec![CachedQuestions::default(); chunk_count];
        }
    }
}

/// Question answering, summarization and quiz generation over a user's document
pub struct Assistant {
    retrieval: Arc<RetrievalService>,
    model: Arc<dyn LanguageModel>,
}

impl Assistant {
    #[inline]
    pub fn new(retrieval: Arc<RetrievalService>, model: Arc<dyn LanguageModel>) -> Self {
        Self { retrieval, model }
    }

    #[inline]
    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    /// Answer `question` from the given context
    #[inline]
    pub fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        self.model.complete(&prompts::answer(context, question))
    }

    /// Summarize a single chunk
    #[inline]
    pub fn summarize(&self, chunk: &str) -> Result<String> {
        self.model.complete(&prompts::summary(chunk))
    }

    /// Ask the model for up to `count` questions about `chunk`
    #[inline]
    pub fn generate_questions(
        &self,
        chunk: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<String>> {
        let response = self
            .model
            .complete(&prompts::questions(chunk, difficulty, count))?;
        Ok(parse_question_list(&response, count))
    }

    /// Answer a generated question from the chunk it came from
    #[inline]
    pub fn generate_answer_for_question(&self, question: &str, chunk: &str) -> Result<String> {
        let response = self
            .model
            .complete(&prompts::answer_for_question(question, chunk))?;
        Ok(response.trim().to_string())
    }

    /// Answer a question about the user's document.
    ///
    /// Returns `None` when no document is loaded for the user.
    #[inline]
    pub fn answer(&self, user_id: &UserId, question: &str) -> Result<Option<String>> {
        if !self.retrieval.has_document(user_id) {
            return Ok(None);
        }

        let chunks = self.retrieval.retrieve_default(user_id, question)?;
        let context = chunks.iter().join(" ");
        debug!(
            "Answering for user {} with {} chunks of context ({} chars)",
            user_id,
            chunks.len(),
            context.len()
        );

        self.generate_answer(&context, question).map(Some)
    }

    /// One summary per chunk, in document order
    #[inline]
    pub fn summarize_document(&self, user_id: &UserId) -> Result<Vec<String>> {
        let chunks = self.retrieval.get_chunks(user_id);
        info!("Summarizing {} chunks for user {}", chunks.len(), user_id);

        chunks.iter().map(|chunk| self.summarize(chunk)).collect()
    }

    /// Generate a quiz of up to `count` questions drawn from the whole document
    #[inline]
    pub fn generate_quiz(
        &self,
        user_id: &UserId,
        difficulty: Difficulty,
        count: usize,
        cache: &mut QuestionCache,
    ) -> Result<Vec<QaPair>> {
        self.generate_quiz_with_rng(user_id, difficulty, count, cache, &mut rand::rng())
    }

    /// [`Self::generate_quiz`] with an explicit random source
    #[inline]
    pub fn generate_quiz_with_rng<R: Rng + ?Sized>(
        &self,
        user_id: &UserId,
        difficulty: Difficulty,
        count: usize,
        cache: &mut QuestionCache,
        rng: &mut R,
    ) -> Result<Vec<QaPair>> {
        let chunks = self.retrieval.get_chunks(user_id);
        cache.align_to(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            let slot = &mut cache.per_chunk[index];
            if slot.requested >= count {
                continue;
            }

            debug!(
                "Generating {} questions for chunk {}/{}",
                count,
                index + 1,
                chunks.len()
            );
            match self.generate_questions(chunk, difficulty, count) {
                Ok(questions) => {
                    *slot = CachedQuestions {
                        questions,
                        requested: count,
                    };
                }
                Err(e) => warn!("Question generation failed for chunk {}: {}", index + 1, e),
            }
        }

        let candidates: Vec<(usize, &String)> = cache
            .per_chunk
            .iter()
            .enumerate()
            .flat_map(|(index, slot)| slot.questions.iter().map(move |q| (index, q)))
            .collect();

        let selected: Vec<&(usize, &String)> =
            candidates.choose_multiple(rng, count.min(candidates.len())).collect();

        info!(
            "Selected {} of {} questions for user {}",
            selected.len(),
            candidates.len(),
            user_id
        );

        let mut quiz = Vec::with_capacity(selected.len());
        for &(chunk_index, question) in selected {
            let answer = self.generate_answer_for_question(question, &chunks[chunk_index])?;
            quiz.push(QaPair {
                question: question.clone(),
                answer,
                chunk_index,
            });
        }
        Ok(quiz)
    }
}

/// Keep the `-` bullet lines of a model response, without the dash, up to `limit`
#[inline]
pub fn parse_question_list(response: &str, limit: usize) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(str::trim)
        .filter(|question| !question.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}
