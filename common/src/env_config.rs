use std::{env, str::FromStr, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything needed to start the API: database connection, JWT
/// validation settings, bind address and workers, CORS and logging
/// preferences, the credit policy, and the settings of the two external
/// providers (text generation and image generation).
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Configuration for JWT (JSON Web Token) authentication.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// File the logger mirrors console output into.
    pub log_file: String,
    /// Credits granted to a teacher the first time they are seen.
    pub initial_credits: i32,
    /// Process-wide request budget per second.
    pub rate_limit_per_second: u32,
    pub text_provider: TextProviderConfig,
    pub image_provider: ImageProviderConfig,
}

#[derive(Clone, Debug)]
/// Configuration for JSON Web Token (JWT) authentication.
///
/// Tokens are issued by the identity provider; this service only validates them
/// with the shared secret.
pub struct JwtConfig {
    /// The secret key used to sign and verify JWTs.
    pub secret: String,
    /// The expiration time for JWTs in hours.
    pub expiration_hours: i64,
}

#[derive(Clone, Debug)]
/// OpenAI-compatible chat completion provider used to write lesson content.
pub struct TextProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
/// Replicate-compatible prediction provider used to illustrate lessons.
pub struct ImageProviderConfig {
    /// Empty when image generation is disabled.
    pub api_token: String,
    pub base_url: String,
    pub model: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
}

/// Reads an optional variable, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_string_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// - `JWT_SECRET`: Required. The secret key for JWT validation.
    /// - `JWT_EXPIRATION_HOURS`: Optional. Defaults to 24 hours if not provided.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or `JWT_EXPIRATION_HOURS` is not a number.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a valid number"),
        }
    }
}

impl TextProviderConfig {
    pub fn from_env() -> Self {
        TextProviderConfig {
            api_key: env::var("TEXT_API_KEY").unwrap_or_default(),
            base_url: env_string_or("TEXT_BASE_URL", "https://api.openai.com/v1"),
            model: env_string_or("TEXT_MODEL", "gpt-4o-mini"),
            temperature: env_or("TEXT_TEMPERATURE", 0.7),
        }
    }
}

impl ImageProviderConfig {
    pub fn from_env() -> Self {
        ImageProviderConfig {
            api_token: env::var("IMAGE_API_TOKEN").unwrap_or_default(),
            base_url: env_string_or("IMAGE_BASE_URL", "https://api.replicate.com"),
            model: env_string_or("IMAGE_MODEL", "black-forest-labs/flux-schnell"),
            poll_interval_secs: env_or("IMAGE_POLL_INTERVAL_SECS", 3),
            max_poll_attempts: env_or("IMAGE_MAX_POLL_ATTEMPTS", 30),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the database
    /// - `JWT_SECRET`: Secret key for JWT validation (via `JwtConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: Log file path (default: "planwise.log")
    /// - `INITIAL_CREDITS`: Credits for a newly seen teacher (default: 5)
    /// - `RATE_LIMIT_PER_SECOND`: Global request budget (default: 10)
    /// - `TEXT_*` and `IMAGE_*`: provider settings, see the provider configs
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_config: JwtConfig::from_env(),
            server_host: env_string_or("IP", "127.0.0.1"),
            server_port: env_or("PORT", 8080),
            num_workers: env_or("WORKERS", 4),
            cors_allowed_origin: env_string_or("CORS_ALLOWED_ORIGIN", "http://localhost:3000"),
            console_logging_enabled: env_string_or("ENABLE_CONSOLE_LOGGING", "true")
                .to_lowercase()
                == "true",
            log_file: env_string_or("LOG_FILE", "planwise.log"),
            initial_credits: env_or("INITIAL_CREDITS", 5),
            rate_limit_per_second: env_or("RATE_LIMIT_PER_SECOND", 10),
            text_provider: TextProviderConfig::from_env(),
            image_provider: ImageProviderConfig::from_env(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
