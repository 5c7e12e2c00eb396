use clap::Parser;

use crate::llm::DEFAULT_PROVIDER_URL;

/// Runtime configuration, from flags or environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "webrev-audit", version, about = "Website audit, redesign and roadmap service")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "WEBREV_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Default provider credential, used when a request carries no override header
    #[arg(long = "api-key", env = "GROQ_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Chat completions endpoint of the generation provider
    #[arg(long, env = "GROQ_BASE_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    /// Requests allowed per caller in one window
    #[arg(long, env = "WEBREV_RATE_LIMIT", default_value_t = 20)]
    pub rate_limit: u32,

    /// Length of the rate limiting window in seconds
    #[arg(long, env = "WEBREV_RATE_WINDOW_SECS", default_value_t = 60)]
    pub rate_window_secs: u64,
}
