use std::env;
use std::time::Duration;

// The Telegram token itself is read by teloxide from TELOXIDE_TOKEN.
#[derive(Clone, Debug)]
pub struct Config {
    pub google_ai_key: String,
    pub gemini_model: String,
    pub request_timeout: Duration,
    pub generation_retries: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            google_ai_key: env::var("GOOGLE_AI_KEY").expect("GOOGLE_AI_KEY is not set"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            request_timeout: Duration::from_secs(
                env::var("GEMINI_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(40),
            ),
            generation_retries: env::var("GEMINI_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            google_ai_key: "test-key".to_string(),
            gemini_model: "gemini-2.0-flash".to_string(),
            request_timeout: Duration::from_secs(1),
            generation_retries: 0,
        }
    }
}
