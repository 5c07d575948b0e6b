use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server.
/// It includes database connection details, JWT configuration,
/// server host and port, number of worker threads, CORS settings,
/// logging preferences, payment processor settings and the
/// vision service used to read uploaded tickets.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// Which store backs the ledger: `postgres` or `memory`.
    pub store_backend: StoreBackend,
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Configuration for JWT (JSON Web Token) verification.
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
    /// File the logger mirrors console output to.
    pub log_file: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Prices charged for actions that are not free.
    pub pricing: PricingConfig,
    /// Vision oracle used to transcribe ticket photos.
    pub vision: VisionConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
/// Configuration for JSON Web Token (JWT) verification.
///
/// Tokens are issued by the identity provider and signed with a shared
/// HS256 secret. `expiration_hours` is only used when this service mints
/// tokens itself (tests and local tooling).
pub struct JwtConfig {
    /// The secret key used to sign and verify JWTs.
    pub secret: String,
    /// The expiration time for JWTs in hours.
    pub expiration_hours: i64,
}

#[derive(Clone, Debug)]
/// Amounts are in minor currency units (pence for `gbp`).
pub struct PricingConfig {
    pub currency: String,
    pub additional_appeal: i64,
    pub vehicle_addition: i64,
}

#[derive(Clone, Debug)]
pub struct VisionConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// Reads the JWT configuration from environment variables:
    /// - `JWT_SECRET`: Required. The secret key for JWT verification.
    /// - `JWT_EXPIRATION_HOURS`: Optional. Defaults to 24 hours if not provided.
    ///
    /// # Panics
    ///
    /// This function will panic if:
    /// - `JWT_SECRET` environment variable is not set
    /// - `JWT_EXPIRATION_HOURS` is set but cannot be parsed as a valid number
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

impl PricingConfig {
    pub fn from_env() -> Self {
        PricingConfig {
            currency: env::var("PAYMENT_CURRENCY")
                .unwrap_or_else(|_| "gbp".to_string())
                .to_lowercase(),
            additional_appeal: env::var("ADDITIONAL_APPEAL_PRICE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            vehicle_addition: env::var("VEHICLE_ADDITION_PRICE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            currency: "gbp".to_string(),
            additional_appeal: 500,
            vehicle_addition: 300,
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
    /// - `DATABASE_URL`: Connection string for the database (unless `STORE=memory`)
    /// - `JWT_SECRET`: Secret key for JWT verification (via `JwtConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `STORE`: `postgres` or `memory` (default: "postgres")
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: Log file path (default: "appeals.log")
    /// - `PAYMENT_CURRENCY`, `ADDITIONAL_APPEAL_PRICE`, `VEHICLE_ADDITION_PRICE`
    /// - `VISION_API_URL`, `VISION_API_KEY`, `VISION_MODEL`
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        let store_backend = match env::var("STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };
        let database_url = match store_backend {
            StoreBackend::Postgres => env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            store_backend,
            database_url,
            jwt_config: JwtConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "appeals.log".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            pricing: PricingConfig::from_env(),
            vision: VisionConfig {
                api_url: env::var("VISION_API_URL").unwrap_or_else(|_| {
                    "https://api.openai.com/v1/chat/completions".to_string()
                }),
                api_key: env::var("VISION_API_KEY").unwrap_or_default(),
                model: env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Configuration used by tests: in-memory store, fixed secret, default prices.
    pub fn for_tests(jwt_secret: &str) -> Arc<Self> {
        Arc::new(Config {
            environment: "test".to_string(),
            store_backend: StoreBackend::Memory,
            database_url: String::new(),
            jwt_config: JwtConfig {
                secret: jwt_secret.to_string(),
                expiration_hours: 1,
            },
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            num_workers: 1,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: false,
            log_file: String::new(),
            stripe_secret_key: String::new(),
            stripe_webhook_secret: String::new(),
            pricing: PricingConfig::default(),
            vision: VisionConfig {
                api_url: String::new(),
                api_key: String::new(),
                model: String::new(),
            },
        })
    }
}
