use async_trait::async_trait;
use rand::thread_rng;
use thiserror::Error;

use crate::gemini::TextGenerator;
use crate::quiz::{extract::extract, ParsedQuiz};

/// Consecutive delivery failures tolerated before a batch is abandoned.
pub const MAX_DELIVERY_RETRIES: u32 = 5;

#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct SinkError(pub String);

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("gave up after repeated delivery failures, {sent} of {requested} quizzes sent")]
    DeliveryRetriesExhausted { sent: u32, requested: u32 },
}

/// Where finished quizzes and progress messages go. Production wraps a
/// Telegram chat; tests record what was sent.
#[async_trait]
pub trait QuizSink: Send + Sync {
    async fn send_quiz(&self, quiz: &ParsedQuiz) -> Result<(), SinkError>;
    async fn send_text(&self, text: &str) -> Result<(), SinkError>;
}

fn quiz_prompt(topic: &str) -> String {
    format!(
        "Create one multiple-choice quiz question about {}. \
         Return the question, four distinct options labeled A-D, and indicate the correct one.\n\
         Preferred format examples:\n\
         Question: <text>\nA: option A\nB: option B\nC: option C\nD: option D\nCorrect: B\n\n\
         If you deviate, still include a clear question and four labeled options.",
        topic
    )
}

/// Generates and delivers `count` quizzes about `topic`, one at a time.
///
/// A delivery failure does not count towards the batch: the user gets a
/// warning and a fresh quiz is generated for another attempt. More than
/// [`MAX_DELIVERY_RETRIES`] failures in a row abandon the batch instead of
/// retrying forever against a chat that rejects every poll.
pub async fn send_quizzes(
    topic: &str,
    count: u32,
    generator: &dyn TextGenerator,
    sink: &dyn QuizSink,
) -> Result<u32, BatchError> {
    let mut sent = 0u32;
    let mut consecutive_failures = 0u32;

    while sent < count {
        let response = generator.generate(&quiz_prompt(topic)).await;
        let mut quiz = extract(topic, &response);
        quiz.shuffle(&mut thread_rng());
        quiz.truncate_for_display();

        match sink.send_quiz(&quiz).await {
            Ok(()) => {
                sent += 1;
                consecutive_failures = 0;
            }
            Err(e) => {
                log::error!("Quiz sending failed: {}", e);
                consecutive_failures += 1;
                if consecutive_failures >= MAX_DELIVERY_RETRIES {
                    return Err(BatchError::DeliveryRetriesExhausted {
                        sent,
                        requested: count,
                    });
                }
                // best effort, progress messages are not worth aborting over
                if let Err(e) = sink
                    .send_text("⚠️ Quiz creation failed. Please try again.")
                    .await
                {
                    log::warn!("Failed to deliver warning message: {}", e);
                }
            }
        }
    }

    let noun = if sent == 1 { "quiz" } else { "quizzes" };
    if let Err(e) = sink
        .send_text(&format!("🎉 All {} {} sent successfully!", sent, noun))
        .await
    {
        log::warn!("Failed to deliver batch summary: {}", e);
    }

    Ok(sent)
}
