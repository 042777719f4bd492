pub mod extract;
pub mod intent;
pub mod send;

// Telegram poll limits: 300 chars for the question, 100 per option
pub const MAX_QUESTION_LEN: usize = 300;
pub const MAX_OPTION_LEN: usize = 100;

pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuiz {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl ParsedQuiz {
    pub fn new(question: String, options: Vec<String>, correct_index: usize) -> Self {
        Self {
            question,
            options,
            correct_index,
        }
    }

    /// Cuts the question and options down to what Telegram accepts.
    pub fn truncate_for_display(&mut self) {
        truncate_chars(&mut self.question, MAX_QUESTION_LEN);
        for option in &mut self.options {
            truncate_chars(option, MAX_OPTION_LEN);
        }
    }
}

fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
}
