// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Quiz pass mark, inclusive. A score at or above this unlocks the next lesson.
pub const PASS_THRESHOLD: f64 = 75.0;

/// Structural contract on generated quizzes: exactly this many questions,
/// each with exactly this many distinct options.
pub const QUIZ_QUESTION_COUNT: usize = 4;
pub const QUIZ_OPTION_COUNT: usize = 4;

/// How many courses the dashboard ranks by enrollment.
pub const TOP_COURSES_LIMIT: i64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// OpenAI-compatible endpoint used for summary/quiz generation.
    pub ai_base_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:skylearn.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let ai_base_url =
            env::var("AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let ai_model = env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let ai_timeout_secs = env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            ai_base_url,
            ai_api_key: env::var("AI_API_KEY").ok(),
            ai_model,
            ai_timeout_secs,
        }
    }
}
