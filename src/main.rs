mod config;
mod gemini;
mod quiz;

use std::sync::Arc;

use async_trait::async_trait;
use config::Config;
use dotenv::dotenv;
use gemini::{GeminiClient, TextGenerator};
use quiz::intent::{classify, Intent, DEFAULT_TOPIC};
use quiz::send::{send_quizzes, BatchError, QuizSink, SinkError};
use quiz::ParsedQuiz;
use teloxide::{
    prelude::*,
    types::{ChatAction, ChatId, PollType},
    utils::command::BotCommands,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
enum Command {
    #[command(description = "welcome message")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "generate quizzes: /quiz <topic> or /quiz <n> <topic>")]
    Quiz(String),
}

#[tokio::main]
async fn main() {
    dotenv().expect("Failed to load .env file");
    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let config = Config::from_env();
    let bot = Bot::from_env();
    let gemini = Arc::new(GeminiClient::new(&config));
    let gemini_for_messages = gemini.clone();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .branch(dptree::entry().filter_command::<Command>().endpoint(
                move |bot: Bot, msg: Message, cmd: Command| {
                    handle_command(gemini.clone(), bot, msg, cmd)
                },
            ))
            .branch(dptree::endpoint(move |bot: Bot, msg: Message| {
                handle_message(gemini_for_messages.clone(), bot, msg)
            })),
    )
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const START_TEXT: &str = "👋 Hi! I'm your AI Quiz Bot powered by Google Gemini.\n\n\
    Use /quiz or plain messages like:\n\
    • /quiz Python\n\
    • /quiz 3 JavaScript\n\
    • create 3 quizzes about HTML\n\
    Type /help for more.";

const HELP_TEXT: &str = "🤖 Commands:\n\
    /start - Welcome\n\
    /help - This message\n\
    /quiz <topic> - Generate 1 quiz\n\
    /quiz <n> <topic> - Generate n quizzes\n\
    Or use natural phrases: 'create 3 quizzes about Math'";

async fn handle_command(
    gemini: Arc<GeminiClient>,
    bot: Bot,
    msg: Message,
    cmd: Command,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, START_TEXT).await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
        }
        Command::Quiz(args) => {
            let args = args.trim();
            if args.is_empty() {
                bot.send_message(msg.chat.id, "❌ Usage:\n/quiz Python or /quiz 3 JavaScript")
                    .await?;
                return Ok(());
            }

            let (count, topic) = parse_quiz_args(args);
            run_batch(gemini, bot, msg.chat.id, &topic, count).await?;
        }
    }
    Ok(())
}

async fn handle_message(gemini: Arc<GeminiClient>, bot: Bot, msg: Message) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text,
        None => return Ok(()),
    };
    log::info!("User: {}", text);

    match classify(text) {
        Intent::GenerateQuiz { topic, count } => {
            run_batch(gemini, bot, msg.chat.id, &topic, count).await?;
        }
        Intent::Converse(text) => {
            // We don't really care about the result here, it just makes the
            // wait for the model feel shorter
            let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;

            let reply = gemini.generate(&text).await;
            bot.send_message(msg.chat.id, reply).await?;
        }
    }
    Ok(())
}

async fn run_batch(
    gemini: Arc<GeminiClient>,
    bot: Bot,
    chat_id: ChatId,
    topic: &str,
    count: u32,
) -> HandlerResult {
    let sink = TelegramSink { bot, chat_id };

    match send_quizzes(topic, count, gemini.as_ref(), &sink).await {
        Ok(sent) => {
            log::info!("Batch finished: {} quizzes sent to chat {}", sent, chat_id);
        }
        Err(BatchError::DeliveryRetriesExhausted { sent, requested }) => {
            log::error!(
                "Batch to chat {} aborted after repeated delivery failures: {}/{} sent",
                chat_id,
                sent,
                requested
            );
            let _ = sink
                .send_text("⚠️ Too many delivery failures, giving up on this batch.")
                .await;
        }
    }
    Ok(())
}

fn parse_quiz_args(args: &str) -> (u32, String) {
    let mut words = args.split_whitespace();
    let first = words.next().unwrap_or("");

    let (count, topic) = match first.parse::<u32>() {
        Ok(count) => (count, words.collect::<Vec<_>>().join(" ")),
        Err(_) => (1, args.to_string()),
    };

    if topic.is_empty() {
        (count, DEFAULT_TOPIC.to_string())
    } else {
        (count, topic)
    }
}

struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

impl From<teloxide::RequestError> for SinkError {
    fn from(err: teloxide::RequestError) -> Self {
        SinkError(err.to_string())
    }
}

#[async_trait]
impl QuizSink for TelegramSink {
    async fn send_quiz(&self, quiz: &ParsedQuiz) -> Result<(), SinkError> {
        self.bot
            .send_poll(self.chat_id, quiz.question.clone(), quiz.options.clone())
            .type_(PollType::Quiz)
            .correct_option_id(quiz.correct_index as u8)
            .explanation("Generated by Google Gemini 🤖")
            .await?;
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), SinkError> {
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }
}
