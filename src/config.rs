use crate::error::{Error, Result};
use crate::store::filter::KeywordMode;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub resume_bucket: String,
    pub keyword_mode: KeywordMode,
    pub public_rps: u32,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            supabase_url: get_env("SUPABASE_URL")?,
            supabase_anon_key: get_env("SUPABASE_ANON_KEY")?,
            resume_bucket: env::var("RESUME_BUCKET").unwrap_or_else(|_| "resumes".to_string()),
            keyword_mode: get_env_parse_or("KEYWORD_FILTER_MODE", KeywordMode::Combined)?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 10)?,
            request_timeout_secs: get_env_parse_or("REQUEST_TIMEOUT_SECS", 30)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_values_fall_back_to_defaults() {
        let value: u32 = get_env_parse_or("JOBBOARD_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        env::set_var("JOBBOARD_TEST_BAD_RPS", "many");
        let err = get_env_parse_or::<u32>("JOBBOARD_TEST_BAD_RPS", 1).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("JOBBOARD_TEST_BAD_RPS")));
    }
}
