use std::fs;
use std::path::Path;
use std::sync::RwLock;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::settings::ScoringConfig;

pub const ENV_BASE_SCORE: &str = "SCORE_BASE";
pub const ENV_TEAM_FACTOR: &str = "SCORE_TEAM_FACTOR";
pub const ENV_MAX_DAILY: &str = "SCORE_MAX_DAILY";
pub const ENV_OWNER_SHARE: &str = "SCORE_OWNER_TEAM_SHARE";

#[derive(Debug, Default, Clone)]
pub struct ScoringConfigUpdate {
    pub base_score: Option<f64>,
    pub team_factor: Option<f64>,
    pub max_daily_score: Option<f64>,
    pub owner_team_share: Option<f64>,
}

/// Holds the active scoring constants. Engines copy the config at
/// construction, so updates only affect engines built afterwards.
pub struct SettingsService {
    current: RwLock<ScoringConfig>,
}

impl SettingsService {
    pub fn new(config: ScoringConfig) -> AppResult<Self> {
        validate(&config)?;
        Ok(Self {
            current: RwLock::new(config),
        })
    }

    /// Defaults overridden by `SCORE_*` environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ScoringConfig::default();
        let overrides = [
            (ENV_BASE_SCORE, &mut config.base_score),
            (ENV_TEAM_FACTOR, &mut config.team_factor),
            (ENV_MAX_DAILY, &mut config.max_daily_score),
            (ENV_OWNER_SHARE, &mut config.owner_team_share),
        ];
        for (key, slot) in overrides {
            if let Some(raw) = lookup(key) {
                *slot = parse_number(key, &raw)?;
            }
        }

        info!(
            target: "app::config",
            base_score = config.base_score,
            team_factor = config.team_factor,
            max_daily_score = config.max_daily_score,
            "scoring configuration loaded from environment"
        );
        Self::new(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        info!(target: "app::config", path = %path.display(), "loading scoring configuration");
        Self::from_yaml_str(&content)
    }

    /// Missing keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: ScoringConfig = if content.trim().is_empty() {
            ScoringConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        Self::new(config)
    }

    pub fn get(&self) -> ScoringConfig {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, input: ScoringConfigUpdate) -> AppResult<ScoringConfig> {
        let mut next = self.get();
        if let Some(value) = input.base_score {
            next.base_score = value;
        }
        if let Some(value) = input.team_factor {
            next.team_factor = value;
        }
        if let Some(value) = input.max_daily_score {
            next.max_daily_score = value;
        }
        if let Some(value) = input.owner_team_share {
            next.owner_team_share = value;
        }
        validate(&next)?;

        match self.current.write() {
            Ok(mut guard) => *guard = next.clone(),
            Err(poisoned) => {
                warn!(target: "app::config", "settings lock poisoned; overwriting");
                *poisoned.into_inner() = next.clone();
            }
        }
        Ok(next)
    }
}

pub fn validate(config: &ScoringConfig) -> AppResult<()> {
    if !config.base_score.is_finite() || config.base_score < 0.0 {
        return Err(AppError::config(
            "baseScore",
            "base score must be a non-negative number",
        ));
    }
    if !config.team_factor.is_finite() || config.team_factor < 0.0 {
        return Err(AppError::config(
            "teamFactor",
            "team factor must be a non-negative number",
        ));
    }
    if !config.max_daily_score.is_finite() || config.max_daily_score <= 0.0 {
        return Err(AppError::config(
            "maxDailyScore",
            "daily ceiling must be greater than zero",
        ));
    }
    if !(0.0..=1.0).contains(&config.owner_team_share) {
        return Err(AppError::config(
            "ownerTeamShare",
            "owner share must lie between 0 and 1",
        ));
    }
    Ok(())
}

fn parse_number(key: &str, raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|err| AppError::config(key, format!("cannot parse {raw:?}: {err}")))
}
