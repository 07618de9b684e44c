use super::Difficulty;

/// Marker that opens every question-answering prompt
pub const ANSWER_MARKER: &str = "Answer the question using only the context below.";
/// Marker that opens every summary prompt
pub const SUMMARY_MARKER: &str = "Write a detailed summary of the following text.";
/// Marker that opens every question-generation prompt
pub const QUESTIONS_MARKER: &str = "Write quiz questions about the following text.";
/// Marker that opens every quiz-answer prompt
pub const QUIZ_ANSWER_MARKER: &str = "Answer this quiz question from the text below.";

#[inline]
pub fn answer(context: &str, question: &str) -> String {
    format!(
        "{ANSWER_MARKER}\n\
         If the context does not contain the answer, say so. \
         Reply in the language of the question.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\
         Answer:"
    )
}

#[inline]
pub fn summary(chunk: &str) -> String {
    format!(
        "{SUMMARY_MARKER}\n\
         Cover its main points in flowing prose, not a list, \
         and write in the same language as the text.\n\n\
         Text:\n{chunk}\n\n\
         Summary:"
    )
}

#[inline]
pub fn questions(chunk: &str, difficulty: Difficulty, count: usize) -> String {
    let level = match difficulty {
        Difficulty::Easy => "easy questions about facts stated directly in the text",
        Difficulty::Medium => "medium questions that need some understanding of the text",
        Difficulty::Hard => "hard questions that need reasoning across several parts of the text",
    };

    format!(
        "{QUESTIONS_MARKER}\n\
         Write {count} {level}. \
         Put each question on its own line starting with \"- \". \
         Do not include answers. \
         Write in the same language as the text.\n\n\
         Text:\n{chunk}\n\n\
         Questions:"
    )
}

#[inline]
pub fn answer_for_question(question: &str, chunk: &str) -> String {
    format!(
        "{QUIZ_ANSWER_MARKER}\n\
         Keep the answer short and write in the same language as the text.\n\n\
         Text:\n{chunk}\n\n\
         Question: {question}\n\
         Answer:"
    )
}
