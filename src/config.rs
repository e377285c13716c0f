use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_ENDPOINT: &str = "OPENAI_ENDPOINT";
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    pub const ONEINCH_API_KEY: &str = "ONEINCH_API_KEY";
    pub const IDENTITY_API_URL: &str = "IDENTITY_API_URL";
    pub const IDENTITY_APP_ID: &str = "IDENTITY_APP_ID";
    pub const IDENTITY_APP_SECRET: &str = "IDENTITY_APP_SECRET";
    pub const FRONTEND_URL: &str = "FRONTEND_URL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/defipilot.db";
    pub const OPENAI_MODEL: &str = "gpt-4o-mini";
    pub const IDENTITY_API_URL: &str = "https://auth.privy.io/api/v1";
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_endpoint: Option<String>,
    pub openai_model: String,
    pub oneinch_api_key: String,
    pub identity_api_url: String,
    pub identity_app_id: String,
    pub identity_app_secret: String,
    /// CORS origin for the web client; any origin when unset
    pub frontend_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            openai_api_key: env::var(env_vars::OPENAI_API_KEY)
                .expect("OPENAI_API_KEY must be set"),
            openai_endpoint: env::var(env_vars::OPENAI_ENDPOINT).ok(),
            openai_model: env::var(env_vars::OPENAI_MODEL)
                .unwrap_or_else(|_| defaults::OPENAI_MODEL.to_string()),
            oneinch_api_key: env::var(env_vars::ONEINCH_API_KEY)
                .expect("ONEINCH_API_KEY must be set"),
            identity_api_url: env::var(env_vars::IDENTITY_API_URL)
                .unwrap_or_else(|_| defaults::IDENTITY_API_URL.to_string()),
            identity_app_id: env::var(env_vars::IDENTITY_APP_ID)
                .expect("IDENTITY_APP_ID must be set"),
            identity_app_secret: env::var(env_vars::IDENTITY_APP_SECRET)
                .expect("IDENTITY_APP_SECRET must be set"),
            frontend_url: env::var(env_vars::FRONTEND_URL).ok(),
        }
    }
}
