use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use crate::quiz::{ParsedQuiz, OPTION_COUNT};

static QUESTION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^question[:\-\s]+").unwrap());
static OPTION_STRICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[A-D][\).:\-]\s*(.+)$").unwrap());
static OPTION_LOOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([A-D])\s+(.+)$").unwrap());
static CORRECT_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)correct[:\s\-]*([A-D])").unwrap());
static ANSWER_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)answer[:\s\-]*([A-D])").unwrap());

/// Turns whatever the model produced into a structurally valid quiz.
///
/// Never fails: every stage has a looser fallback and the last resort is a
/// synthetic question/options built from the topic, so even an empty string
/// (or the client's failure sentinel) yields four options and an index in
/// range.
pub fn extract(topic: &str, raw_text: &str) -> ParsedQuiz {
    let lines: Vec<&str> = raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    ParsedQuiz::new(
        extract_question(topic, &lines),
        extract_options(topic, &lines),
        extract_correct_index(&lines),
    )
}

fn extract_question(topic: &str, lines: &[&str]) -> String {
    let mut question = None;
    for line in lines {
        // a line explicitly announcing the question wins
        if QUESTION_PREFIX.is_match(line) {
            question = Some(QUESTION_PREFIX.replace(line, "").trim().to_string());
            break;
        }
        // otherwise the first line containing '?' is a reasonable guess
        if line.contains('?') {
            question = Some(line.to_string());
            break;
        }
    }

    match question {
        Some(question) if !question.is_empty() => question,
        _ => format!("What is the correct answer about {}?", topic),
    }
}

fn extract_options(topic: &str, lines: &[&str]) -> Vec<String> {
    let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);

    for line in lines {
        if let Some(caps) = OPTION_STRICT.captures(line) {
            options.push(caps[1].trim().to_string());
        }
        if options.len() == OPTION_COUNT {
            break;
        }
    }

    // the model used another shape, e.g. "A Option text" without punctuation
    if options.len() < OPTION_COUNT {
        for line in lines {
            if let Some(caps) = OPTION_LOOSE.captures(line) {
                let text = caps[2].trim().to_string();
                if !options.contains(&text) {
                    options.push(text);
                }
            }
            if options.len() == OPTION_COUNT {
                break;
            }
        }
    }

    while options.len() < OPTION_COUNT {
        let letter = (b'A' + options.len() as u8) as char;
        options.push(format!("{} Option {}", topic, letter));
    }

    options
}

fn extract_correct_index(lines: &[&str]) -> usize {
    let mut letter = None;
    for line in lines {
        if let Some(caps) = CORRECT_LETTER.captures(line) {
            letter = caps[1].chars().next();
            break;
        }
    }
    if letter.is_none() {
        // "Answer: B" style
        for line in lines {
            if let Some(caps) = ANSWER_LETTER.captures(line) {
                letter = caps[1].chars().next();
                break;
            }
        }
    }

    match letter {
        Some(letter) => {
            let index = (letter.to_ascii_uppercase() as u8).wrapping_sub(b'A') as usize;
            if index < OPTION_COUNT {
                index
            } else {
                0
            }
        }
        None => 0,
    }
}

impl ParsedQuiz {
    /// Shuffles the options in place, remapping `correct_index` to wherever
    /// the originally correct option landed.
    ///
    /// Tracks indices rather than looking the text up afterwards: option
    /// text is not guaranteed unique, so a string search could land on the
    /// wrong occurrence.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        let correct = self.correct_index;
        let mut indexed: Vec<(usize, String)> = self.options.drain(..).enumerate().collect();
        indexed.shuffle(rng);

        self.correct_index = indexed
            .iter()
            .position(|(original, _)| *original == correct)
            .unwrap_or(0);
        self.options = indexed.into_iter().map(|(_, text)| text).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::FAILURE_SENTINEL;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn extracts_preferred_format() {
        let raw = "Question: What is 2+2?\nA: 3\nB: 4\nC: 5\nD: 6\nCorrect: B";
        let quiz = extract("Math", raw);

        assert_eq!(quiz.question, "What is 2+2?");
        assert_eq!(quiz.options, vec!["3", "4", "5", "6"]);
        assert_eq!(quiz.correct_index, 1);
    }

    #[test]
    fn empty_input_yields_fully_synthetic_quiz() {
        let quiz = extract("Rust", "");

        assert_eq!(quiz.question, "What is the correct answer about Rust?");
        assert_eq!(
            quiz.options,
            vec![
                "Rust Option A",
                "Rust Option B",
                "Rust Option C",
                "Rust Option D"
            ]
        );
        assert_eq!(quiz.correct_index, 0);
    }

    #[test]
    fn failure_sentinel_degrades_to_synthetic_quiz() {
        let quiz = extract("History", FAILURE_SENTINEL);

        assert_eq!(quiz.options.len(), OPTION_COUNT);
        assert!(quiz.correct_index < OPTION_COUNT);
        assert!(quiz.options[0].starts_with("History Option"));
    }

    #[test]
    fn falls_back_to_first_line_with_question_mark() {
        let raw = "Here is a quiz.\nWhich planet is red?\nA) Venus\nB) Mars\nC) Pluto\nD) Io\nCorrect: B";
        let quiz = extract("Space", raw);

        assert_eq!(quiz.question, "Which planet is red?");
        assert_eq!(quiz.correct_index, 1);
    }

    #[test]
    fn question_prefix_accepts_dash_and_whitespace_separators() {
        let quiz = extract("X", "Question - Who wrote Kobzar?\nA: Shevchenko");
        assert_eq!(quiz.question, "Who wrote Kobzar?");

        let quiz = extract("X", "question   What year is it?");
        assert_eq!(quiz.question, "What year is it?");
    }

    #[test]
    fn strict_pass_accepts_paren_colon_dot_and_dash() {
        let raw = "Q?\na) one\nB: two\nC. three\nd- four\nCorrect: C";
        let quiz = extract("X", raw);

        assert_eq!(quiz.options, vec!["one", "two", "three", "four"]);
        assert_eq!(quiz.correct_index, 2);
    }

    #[test]
    fn loose_pass_fills_in_unpunctuated_options() {
        let raw = "What is 2+2?\nA: 3\nB 4\nC 5\nD 6";
        let quiz = extract("Math", raw);

        assert_eq!(quiz.options, vec!["3", "4", "5", "6"]);
    }

    #[test]
    fn loose_pass_skips_already_collected_text() {
        // "B 4" appears twice; the duplicate body must not be taken again
        let raw = "What is 2+2?\nB 4\nB 4\nC 5\nD 6";
        let quiz = extract("Math", raw);

        assert_eq!(quiz.options, vec!["4", "5", "6", "Math Option D"]);
    }

    #[test]
    fn short_output_is_padded_with_topic_placeholders() {
        let raw = "Question: Pick one\nA: first\nB: second\nCorrect: A";
        let quiz = extract("Chemistry", raw);

        assert_eq!(
            quiz.options,
            vec!["first", "second", "Chemistry Option C", "Chemistry Option D"]
        );
        assert_eq!(quiz.correct_index, 0);
    }

    #[test]
    fn missing_correct_marker_defaults_to_first_option() {
        let raw = "Question: Pick\nA: w\nB: x\nC: y\nD: z";
        let quiz = extract("X", raw);

        assert_eq!(quiz.correct_index, 0);
    }

    #[test]
    fn answer_marker_is_a_fallback_for_correct() {
        let raw = "Question: Pick\nA: w\nB: x\nC: y\nD: z\nAnswer: D";
        let quiz = extract("X", raw);

        assert_eq!(quiz.correct_index, 3);
    }

    #[test]
    fn correct_marker_letter_is_case_insensitive() {
        let raw = "Question: Pick\nA: w\nB: x\nC: y\nD: z\ncorrect - c";
        let quiz = extract("X", raw);

        assert_eq!(quiz.correct_index, 2);
    }

    #[test]
    fn never_fails_on_arbitrary_garbage() {
        for raw in ["?????", "A", "\n\n\n", "Correct: Z", "1) not a letter option"] {
            let quiz = extract("Anything", raw);
            assert_eq!(quiz.options.len(), OPTION_COUNT);
            assert!(quiz.correct_index < OPTION_COUNT);
            assert!(!quiz.question.is_empty());
        }
    }

    #[test]
    fn shuffle_preserves_correct_option_for_every_permutation() {
        let options = vec![
            "alpha".to_string(),
            "beta".to_string(),
            "gamma".to_string(),
            "delta".to_string(),
        ];

        let mut seen = HashSet::new();
        for seed in 0..10_000u64 {
            for correct in 0..OPTION_COUNT {
                let mut quiz = ParsedQuiz::new("q".to_string(), options.clone(), correct);
                let mut rng = StdRng::seed_from_u64(seed);
                quiz.shuffle(&mut rng);

                assert_eq!(quiz.options[quiz.correct_index], options[correct]);
            }

            let mut quiz = ParsedQuiz::new("q".to_string(), options.clone(), 0);
            let mut rng = StdRng::seed_from_u64(seed);
            quiz.shuffle(&mut rng);
            seen.insert(quiz.options.clone());
        }

        // ten thousand draws comfortably cover all orderings of 4 options
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn shuffle_tracks_index_despite_duplicate_options() {
        let options = vec![
            "same".to_string(),
            "same".to_string(),
            "same".to_string(),
            "unique".to_string(),
        ];

        for seed in 0..100u64 {
            let mut quiz = ParsedQuiz::new("q".to_string(), options.clone(), 3);
            let mut rng = StdRng::seed_from_u64(seed);
            quiz.shuffle(&mut rng);

            assert_eq!(quiz.options[quiz.correct_index], "unique");
        }
    }
}
