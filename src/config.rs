use crate::error::{Error, Result};
use crate::models::question::QuestionType;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_PASS_THRESHOLD: f64 = 80.0;
pub const DEFAULT_SUBMIT_RPS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub submit_rps: u32,
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Knobs of the scoring pipeline. Handed to the services explicitly so the
/// formula can be exercised with arbitrary thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub pass_threshold: f64,
    pub max_attempts: Option<i64>,
    pub multipliers: TypeMultipliers,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            max_attempts: None,
            multipliers: TypeMultipliers::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeMultipliers {
    pub closed_choice: f64,
    pub open_text: f64,
}

impl Default for TypeMultipliers {
    fn default() -> Self {
        Self {
            closed_choice: 1.0,
            open_text: 1.5,
        }
    }
}

impl TypeMultipliers {
    pub fn factor(&self, question_type: QuestionType) -> f64 {
        match question_type {
            QuestionType::ClosedChoice => self.closed_choice,
            QuestionType::OpenText => self.open_text,
        }
    }

    /// Parses `closed_choice=1.0,open_text=1.5`. Omitted types keep their defaults.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut table = Self::default();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                Error::Config(format!("Invalid multiplier entry '{}'", pair))
            })?;
            let value: f64 = value.trim().parse().map_err(|e| {
                Error::Config(format!("Invalid multiplier for {}: {}", name.trim(), e))
            })?;
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "Multiplier for {} must be positive",
                    name.trim()
                )));
            }
            match name.trim() {
                "closed_choice" => table.closed_choice = value,
                "open_text" => table.open_text = value,
                other => {
                    return Err(Error::Config(format!("Unknown question type '{}'", other)))
                }
            }
        }
        Ok(table)
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let pass_threshold = match env::var("TEST_PASS_PERCENT").ok() {
            Some(raw) => parse_pass_threshold(&raw)?,
            None => DEFAULT_PASS_THRESHOLD,
        };
        let multipliers = match env::var("QUESTION_TYPE_MULTIPLIERS").ok() {
            Some(raw) => TypeMultipliers::parse(&raw)?,
            None => TypeMultipliers::default(),
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            submit_rps: get_env_parse_or("SUBMIT_RPS", DEFAULT_SUBMIT_RPS)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            log_format: match env::var("LOG_FORMAT").ok().as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            scoring: ScoringConfig {
                pass_threshold,
                max_attempts: parse_max_attempts(env::var("TEST_MAX_ATTEMPTS").ok().as_deref()),
                multipliers,
            },
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
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn parse_pass_threshold(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for TEST_PASS_PERCENT: {}", e)))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(Error::Config(
            "TEST_PASS_PERCENT must be between 0 and 100".to_string(),
        ));
    }
    Ok(value)
}

/// Unset, blank, non-numeric and non-positive values all mean "unlimited".
pub fn parse_max_attempts(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|cap| *cap > 0)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_attempts_unset_or_non_positive_is_unlimited() {
        assert_eq!(parse_max_attempts(None), None);
        assert_eq!(parse_max_attempts(Some("")), None);
        assert_eq!(parse_max_attempts(Some("0")), None);
        assert_eq!(parse_max_attempts(Some("-2")), None);
        assert_eq!(parse_max_attempts(Some("abc")), None);
        assert_eq!(parse_max_attempts(Some(" 3 ")), Some(3));
    }

    #[test]
    fn multipliers_override_only_named_types() {
        let table = TypeMultipliers::parse("open_text=2.0").unwrap();
        assert_eq!(table.closed_choice, 1.0);
        assert_eq!(table.open_text, 2.0);
        assert_eq!(table.factor(QuestionType::OpenText), 2.0);
    }

    #[test]
    fn multipliers_reject_garbage() {
        assert!(TypeMultipliers::parse("open_text").is_err());
        assert!(TypeMultipliers::parse("essay=2").is_err());
        assert!(TypeMultipliers::parse("closed_choice=-1").is_err());
    }

    #[test]
    fn pass_threshold_must_be_a_percentage() {
        assert_eq!(parse_pass_threshold("50").unwrap(), 50.0);
        assert!(parse_pass_threshold("150").is_err());
        assert!(parse_pass_threshold("half").is_err());
    }

    #[test]
    fn default_open_text_weight_is_stricter() {
        let table = TypeMultipliers::default();
        assert!(table.open_text > table.closed_choice);
    }
}
