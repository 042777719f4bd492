use once_cell::sync::Lazy;
use regex::Regex;

static QUIZ_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s+quiz").unwrap());
// longest alternatives first, so "quizzes" does not leave a "zes" behind
static TRIGGER_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"create|make|quizzes|quiz|questions|question|about|\d+").unwrap());

pub const DEFAULT_TOPIC: &str = "General Knowledge";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    GenerateQuiz { topic: String, count: u32 },
    Converse(String),
}

/// Decides whether a free-form message asks for quizzes or is plain chat.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();

    if !lower.contains("quiz") && !lower.contains("question") {
        return Intent::Converse(text.to_string());
    }

    // "create 3 quizzes ..." carries an explicit count
    let count = QUIZ_COUNT
        .captures(&lower)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(1);

    let topic = TRIGGER_WORDS.replace_all(&lower, "");
    let topic = topic.trim();
    let topic = if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic.to_string()
    };

    Intent::GenerateQuiz { topic, count }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_phrase_with_count_and_topic() {
        assert_eq!(
            classify("create 3 quizzes about HTML"),
            Intent::GenerateQuiz {
                topic: "html".to_string(),
                count: 3,
            }
        );
    }

    #[test]
    fn plain_chat_passes_through_unchanged() {
        assert_eq!(
            classify("hello there"),
            Intent::Converse("hello there".to_string())
        );
    }

    #[test]
    fn count_defaults_to_one() {
        assert_eq!(
            classify("make quiz on rust"),
            Intent::GenerateQuiz {
                topic: "on rust".to_string(),
                count: 1,
            }
        );
    }

    #[test]
    fn empty_topic_falls_back_to_general_knowledge() {
        assert_eq!(
            classify("quiz"),
            Intent::GenerateQuiz {
                topic: DEFAULT_TOPIC.to_string(),
                count: 1,
            }
        );
    }

    #[test]
    fn question_keyword_also_triggers_generation() {
        assert_eq!(
            classify("question about coffee"),
            Intent::GenerateQuiz {
                topic: "coffee".to_string(),
                count: 1,
            }
        );
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        match classify("CREATE 2 QUIZZES ABOUT SPACE") {
            Intent::GenerateQuiz { topic, count } => {
                assert_eq!(topic, "space");
                assert_eq!(count, 2);
            }
            other => panic!("expected GenerateQuiz, got {:?}", other),
        }
    }

    #[test]
    fn converse_keeps_original_casing() {
        assert_eq!(
            classify("Tell me a JOKE"),
            Intent::Converse("Tell me a JOKE".to_string())
        );
    }
}
