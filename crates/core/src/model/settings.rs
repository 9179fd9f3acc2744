use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("max attempts must be > 0")]
    InvalidMaxAttempts,

    #[error("hint penalty must be a finite value in [0, 100]")]
    InvalidHintPenalty,

    #[error("quiz fallback value must be a finite value in (0, 100]")]
    InvalidQuizFallback,

    #[error("quiz wrong-answer ratio must be in [0, 1]")]
    InvalidQuizWrongRatio,

    #[error("time score floor must be <= 100")]
    InvalidTimeScoreFloor,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables of the scoring and progression policies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEngineSettings", into = "RawEngineSettings")]
pub struct EngineSettings {
    max_attempts: u32,
    hint_penalty: f64,
    auto_advance_delay_ms: u64,
    puzzle_reset_delay_ms: u64,
    quiz_fallback_value: f64,
    quiz_wrong_ratio: f64,
    time_score_floor: u32,
}

impl Default for EngineSettings {
    /// Three attempts before lockout, 5 points per hint, 1.5 s auto-advance,
    /// 1 s puzzle reset, 10 points per quiz question when the total is unknown,
    /// 20% quiz penalty and a time-score floor of 60.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            hint_penalty: 5.0,
            auto_advance_delay_ms: 1_500,
            puzzle_reset_delay_ms: 1_000,
            quiz_fallback_value: 10.0,
            quiz_wrong_ratio: 0.2,
            time_score_floor: 60,
        }
    }
}

impl EngineSettings {
    /// Creates custom engine settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value is outside its documented range.
    pub fn new(
        max_attempts: u32,
        hint_penalty: f64,
        auto_advance_delay_ms: u64,
        puzzle_reset_delay_ms: u64,
        quiz_fallback_value: f64,
        quiz_wrong_ratio: f64,
        time_score_floor: u32,
    ) -> Result<Self, SettingsError> {
        if max_attempts == 0 {
            return Err(SettingsError::InvalidMaxAttempts);
        }
        if !hint_penalty.is_finite() || !(0.0..=100.0).contains(&hint_penalty) {
            return Err(SettingsError::InvalidHintPenalty);
        }
        if !quiz_fallback_value.is_finite()
            || quiz_fallback_value <= 0.0
            || quiz_fallback_value > 100.0
        {
            return Err(SettingsError::InvalidQuizFallback);
        }
        if !quiz_wrong_ratio.is_finite() || !(0.0..=1.0).contains(&quiz_wrong_ratio) {
            return Err(SettingsError::InvalidQuizWrongRatio);
        }
        if time_score_floor > 100 {
            return Err(SettingsError::InvalidTimeScoreFloor);
        }

        Ok(Self {
            max_attempts,
            hint_penalty,
            auto_advance_delay_ms,
            puzzle_reset_delay_ms,
            quiz_fallback_value,
            quiz_wrong_ratio,
            time_score_floor,
        })
    }

    /// Returns a copy with a different attempt limit.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidMaxAttempts` for zero.
    pub fn with_max_attempts(self, max_attempts: u32) -> Result<Self, SettingsError> {
        Self::new(
            max_attempts,
            self.hint_penalty,
            self.auto_advance_delay_ms,
            self.puzzle_reset_delay_ms,
            self.quiz_fallback_value,
            self.quiz_wrong_ratio,
            self.time_score_floor,
        )
    }

    /// Returns a copy with a different hint penalty.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidHintPenalty` when out of range.
    pub fn with_hint_penalty(self, hint_penalty: f64) -> Result<Self, SettingsError> {
        Self::new(
            self.max_attempts,
            hint_penalty,
            self.auto_advance_delay_ms,
            self.puzzle_reset_delay_ms,
            self.quiz_fallback_value,
            self.quiz_wrong_ratio,
            self.time_score_floor,
        )
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn hint_penalty(&self) -> f64 {
        self.hint_penalty
    }

    #[must_use]
    pub fn auto_advance_delay_ms(&self) -> u64 {
        self.auto_advance_delay_ms
    }

    #[must_use]
    pub fn puzzle_reset_delay_ms(&self) -> u64 {
        self.puzzle_reset_delay_ms
    }

    #[must_use]
    pub fn quiz_fallback_value(&self) -> f64 {
        self.quiz_fallback_value
    }

    #[must_use]
    pub fn quiz_wrong_ratio(&self) -> f64 {
        self.quiz_wrong_ratio
    }

    #[must_use]
    pub fn time_score_floor(&self) -> u32 {
        self.time_score_floor
    }
}

/// Serde shape; every field optional so partial config files work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawEngineSettings {
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    hint_penalty: Option<f64>,
    #[serde(default)]
    auto_advance_delay_ms: Option<u64>,
    #[serde(default)]
    puzzle_reset_delay_ms: Option<u64>,
    #[serde(default)]
    quiz_fallback_value: Option<f64>,
    #[serde(default)]
    quiz_wrong_ratio: Option<f64>,
    #[serde(default)]
    time_score_floor: Option<u32>,
}

impl TryFrom<RawEngineSettings> for EngineSettings {
    type Error = SettingsError;

    fn try_from(raw: RawEngineSettings) -> Result<Self, Self::Error> {
        let d = EngineSettings::default();
        EngineSettings::new(
            raw.max_attempts.unwrap_or(d.max_attempts),
            raw.hint_penalty.unwrap_or(d.hint_penalty),
            raw.auto_advance_delay_ms.unwrap_or(d.auto_advance_delay_ms),
            raw.puzzle_reset_delay_ms.unwrap_or(d.puzzle_reset_delay_ms),
            raw.quiz_fallback_value.unwrap_or(d.quiz_fallback_value),
            raw.quiz_wrong_ratio.unwrap_or(d.quiz_wrong_ratio),
            raw.time_score_floor.unwrap_or(d.time_score_floor),
        )
    }
}

impl From<EngineSettings> for RawEngineSettings {
    fn from(s: EngineSettings) -> Self {
        Self {
            max_attempts: Some(s.max_attempts),
            hint_penalty: Some(s.hint_penalty),
            auto_advance_delay_ms: Some(s.auto_advance_delay_ms),
            puzzle_reset_delay_ms: Some(s.puzzle_reset_delay_ms),
            quiz_fallback_value: Some(s.quiz_fallback_value),
            quiz_wrong_ratio: Some(s.quiz_wrong_ratio),
            time_score_floor: Some(s.time_score_floor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let d = EngineSettings::default();
        let rebuilt = EngineSettings::new(
            d.max_attempts(),
            d.hint_penalty(),
            d.auto_advance_delay_ms(),
            d.puzzle_reset_delay_ms(),
            d.quiz_fallback_value(),
            d.quiz_wrong_ratio(),
            d.time_score_floor(),
        )
        .unwrap();
        assert_eq!(rebuilt, d);
        assert_eq!(d.max_attempts(), 3);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let d = EngineSettings::default();
        assert_eq!(
            d.with_max_attempts(0).unwrap_err(),
            SettingsError::InvalidMaxAttempts
        );
        assert_eq!(
            d.with_hint_penalty(f64::NAN).unwrap_err(),
            SettingsError::InvalidHintPenalty
        );
        assert_eq!(
            EngineSettings::new(3, 5.0, 0, 0, 10.0, 1.5, 60).unwrap_err(),
            SettingsError::InvalidQuizWrongRatio
        );
        assert_eq!(
            EngineSettings::new(3, 5.0, 0, 0, 10.0, 0.2, 101).unwrap_err(),
            SettingsError::InvalidTimeScoreFloor
        );
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: EngineSettings = serde_json::from_str(r#"{ "hint_penalty": 2.5 }"#).unwrap();
        assert_eq!(settings.hint_penalty(), 2.5);
        assert_eq!(settings.max_attempts(), 3);

        let bad = serde_json::from_str::<EngineSettings>(r#"{ "max_attempts": 0 }"#);
        assert!(bad.is_err());
    }
}
