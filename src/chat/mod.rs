// Chat module
// Line-oriented conversation loop over the assistant


use itertools::Itertools;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::Result;
use crate::assistant::{Assistant, DEFAULT_QUIZ_COUNT, Difficulty, QaPair, QuestionCache};
use crate::documents::load_document;
use crate::store::UserId;

pub const NO_DOCUMENT_REPLY: &str = "Please upload a document first";

const HELP_TEXT: &str = "\
Commands:
  /load <path>                      Load a document (replaces the current one)
  /ask <question>                   Ask about the document (plain text works too)
  /summarize                        Summarize the document chunk by chunk
  /quiz [easy|medium|hard] [count]  Generate a quiz
  /answers                          Show the answers to the last quiz
  /new                              Forget the current document
  /help                             Show this help
  /quit                             Leave";

/// What the user is currently working with
#[derive(Debug, Default)]
pub struct Conversation {
    pub document: Option<String>,
    pub difficulty: Difficulty,
    pub question_cache: QuestionCache,
    pub last_quiz: Vec<QaPair>,
}

impl Conversation {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Ask(String),
    Summarize,
    Quiz {
        difficulty: Option<Difficulty>,
        count: Option<usize>,
    },
    Answers,
    New,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines give `Ok(None)`.
    #[inline]
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Self::Ask(line.to_string())));
        };

        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, args)| (name, args.trim()));

        let command = match name.to_ascii_lowercase().as_str() {
            "load" | "upload" => {
                if args.is_empty() {
                    return Err("Usage: /load <path>".to_string());
                }
                Self::Load(PathBuf::from(args))
            }
            "ask" => {
                if args.is_empty() {
                    return Err("Usage: /ask <question>".to_string());
                }
                Self::Ask(args.to_string())
            }
            "summarize" | "summary" => Self::Summarize,
            "quiz" => Self::parse_quiz(args)?,
            "answers" => Self::Answers,
            "new" => Self::New,
            "help" | "start" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("Unknown command /{other}. Type /help for a list.")),
        };
        Ok(Some(command))
    }

    fn parse_quiz(args: &str) -> std::result::Result<Self, String> {
        let mut difficulty = None;
        let mut count = None;

        for arg in args.split_whitespace() {
            if let Some(parsed) = Difficulty::parse(arg) {
                difficulty = Some(parsed);
                continue;
            }
            match arg.parse::<usize>() {
                Ok(parsed) if parsed > 0 => count = Some(parsed),
                _ => return Err("Usage: /quiz [easy|medium|hard] [count]".to_string()),
            }
        }

        Ok(Self::Quiz { difficulty, count })
    }
}

/// Result of handling one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Silent,
    Quit,
}

/// One user's interactive session
pub struct ChatSession {
    assistant: Arc<Assistant>,
    user_id: UserId,
    conversation: Conversation,
}

impl ChatSession {
    #[inline]
    pub fn new(assistant: Arc<Assistant>, user_id: UserId) -> Self {
        Self {
            assistant,
            user_id,
            conversation: Conversation::default(),
        }
    }

    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[inline]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Read commands from `input` until `/quit` or end of input.
    ///
    /// Failures of a single command are reported to `output` and the loop
    /// continues; only I/O errors on the streams end it.
    #[inline]
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        info!("Starting chat session for user {}", self.user_id);
        writeln!(output, "Load a document with /load <path>, then ask away. /help lists commands.")?;

        for line in input.lines() {
            let line = line?;
            match self.handle_line(&line) {
                Outcome::Reply(reply) => writeln!(output, "{reply}")?,
                Outcome::Silent => {}
                Outcome::Quit => {
                    writeln!(output, "Bye.")?;
                    break;
                }
            }
            output.flush()?;
        }

        info!("Chat session for user {} ended", self.user_id);
        Ok(())
    }

    #[inline]
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Outcome::Silent,
            Err(usage) => return Outcome::Reply(usage),
        };

        debug!("User {} sent {:?}", self.user_id, command);
        match self.execute(command) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Command failed for user {}: {}", self.user_id, e);
                Outcome::Reply(format!("Error: {e}"))
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<Outcome> {
        let reply = match command {
            Command::Load(path) => self.load(&path)?,
            Command::Ask(question) => self.ask(&question)?,
            Command::Summarize => self.summarize()?,
            Command::Quiz { difficulty, count } => self.quiz(difficulty, count)?,
            Command::Answers => self.answers(),
            Command::New => {
                self.assistant.retrieval().clear(&self.user_id);
                self.conversation.reset();
                "Document cleared. Load a new one with /load <path>.".to_string()
            }
            Command::Help => HELP_TEXT.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Reply(reply))
    }

    fn load(&mut self, path: &Path) -> Result<String> {
        let (text, doc_type) = load_document(path)?;

        // The old document is gone from here on, even if ingestion fails
        let difficulty = self.conversation.difficulty;
        self.conversation.reset();
        self.conversation.difficulty = difficulty;

        let chunks = self
            .assistant
            .retrieval()
            .replace_document(&self.user_id, &text, doc_type)?;

        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        if chunks == 0 {
            return Ok(format!("{name} contains no readable text."));
        }

        let reply = format!("Loaded {name} ({doc_type}, {chunks} chunks). Ask me anything about it.");
        self.conversation.document = Some(name);
        Ok(reply)
    }

    fn ask(&self, question: &str) -> Result<String> {
        Ok(self
            .assistant
            .answer(&self.user_id, question)?
            .unwrap_or_else(|| NO_DOCUMENT_REPLY.to_string()))
    }

    fn summarize(&self) -> Result<String> {
        if !self.has_document() {
            return Ok(NO_DOCUMENT_REPLY.to_string());
        }
        let summaries = self.assistant.summarize_document(&self.user_id)?;
        Ok(summaries.join("\n\n"))
    }

    fn quiz(&mut self, difficulty: Option<Difficulty>, count: Option<usize>) -> Result<String> {
        if !self.has_document() {
            return Ok(NO_DOCUMENT_REPLY.to_string());
        }

        match difficulty {
            Some(difficulty) if difficulty != self.conversation.difficulty => {
                self.conversation.difficulty = difficulty;
                self.conversation.question_cache.clear();
            }
            _ => {}
        }

        let quiz = self.assistant.generate_quiz(
            &self.user_id,
            self.conversation.difficulty,
            count.unwrap_or(DEFAULT_QUIZ_COUNT),
            &mut self.conversation.question_cache,
        )?;

        if quiz.is_empty() {
            self.conversation.last_quiz.clear();
            return Ok("Could not generate any questions for this document.".to_string());
        }

        let questions = quiz
            .iter()
            .enumerate()
            .map(|(number, pair)| format!("{}. {}", number + 1, pair.question))
            .join("\n");
        let reply = format!(
            "Quiz ({}):\n{}\nUse /answers to see the answers.",
            self.conversation.difficulty, questions
        );

        self.conversation.last_quiz = quiz;
        Ok(reply)
    }

    fn answers(&self) -> String {
        if self.conversation.last_quiz.is_empty() {
            return "No quiz yet. Use /quiz to generate one.".to_string();
        }

        let answers = self
            .conversation
            .last_quiz
            .iter()
            .enumerate()
            .map(|(number, pair)| format!("{}. {}\n   {}", number + 1, pair.question, pair.answer))
            .join("\n");
        format!("Answers:\n{answers}")
    }

    fn has_document(&self) -> bool {
        self.assistant.retrieval().has_document(&self.user_id)
    }
}
