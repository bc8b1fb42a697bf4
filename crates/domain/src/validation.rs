//! Input validation, applied before any state is touched

use std::str::FromStr;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::{Closing, StyleConfig, Structure, Tone};

/// Rejected input; never leaves a partial effect behind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Draft text is empty")]
    EmptyDraft,
    #[error("Unknown {field} '{value}' (expected one of: {expected})")]
    UnknownOption {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("maxLength must be at least {min}, got {value}")]
    MaxLengthTooSmall { value: usize, min: usize },
    #[error("Variation count must be 2 or 3, got {0}")]
    InvalidCount(usize),
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("Real posting is not supported; dry_run must be true")]
    RealPostingUnsupported,
    #[error("Analysis window must be a positive integer")]
    EmptyWindow,
}

impl FromStr for Tone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "bold" => Ok(Tone::Bold),
            "friendly" => Ok(Tone::Friendly),
            _ => Err(ValidationError::UnknownOption {
                field: "tone",
                value: s.to_string(),
                expected: "professional, casual, bold, friendly",
            }),
        }
    }
}

impl FromStr for Structure {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "narrative" => Ok(Structure::Narrative),
            "bulleted" => Ok(Structure::Bulleted),
            "question-led" => Ok(Structure::QuestionLed),
            _ => Err(ValidationError::UnknownOption {
                field: "structure",
                value: s.to_string(),
                expected: "narrative, bulleted, question-led",
            }),
        }
    }
}

impl FromStr for Closing {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cta" => Ok(Closing::Cta),
            "reflective" => Ok(Closing::Reflective),
            "none" => Ok(Closing::None),
            _ => Err(ValidationError::UnknownOption {
                field: "closing",
                value: s.to_string(),
                expected: "cta, reflective, none",
            }),
        }
    }
}

/// Loosely-typed style options as they arrive from config files or flags
#[derive(Debug, Clone, Default)]
pub struct StyleOptions {
    pub tone: Option<String>,
    pub structure: Option<String>,
    pub closing: Option<String>,
    pub max_length: Option<usize>,
}

impl StyleOptions {
    /// Resolve against `base`, rejecting unknown values
    pub fn resolve(&self, base: StyleConfig) -> Result<StyleConfig, ValidationError> {
        let style = StyleConfig {
            tone: parse_opt(self.tone.as_deref())?.unwrap_or(base.tone),
            structure: parse_opt(self.structure.as_deref())?.unwrap_or(base.structure),
            closing: parse_opt(self.closing.as_deref())?.unwrap_or(base.closing),
            max_length: self.max_length.unwrap_or(base.max_length),
        };
        validate_style(&style)?;
        Ok(style)
    }
}

fn parse_opt<T: FromStr<Err = ValidationError>>(
    value: Option<&str>,
) -> Result<Option<T>, ValidationError> {
    value.map(str::parse).transpose()
}

pub fn validate_style(style: &StyleConfig) -> Result<(), ValidationError> {
    if style.max_length < StyleConfig::MIN_MAX_LENGTH {
        return Err(ValidationError::MaxLengthTooSmall {
            value: style.max_length,
            min: StyleConfig::MIN_MAX_LENGTH,
        });
    }
    Ok(())
}

pub fn validate_draft_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyDraft);
    }
    Ok(())
}

pub fn validate_count(count: usize) -> Result<(), ValidationError> {
    match count {
        2 | 3 => Ok(()),
        other => Err(ValidationError::InvalidCount(other)),
    }
}

/// Parse an RFC 3339 timestamp (explicit offset or `Z`) that lies strictly after `now`
pub fn parse_schedule(raw: &str, now: OffsetDateTime) -> Result<OffsetDateTime, ValidationError> {
    let at = OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .map_err(|e| ValidationError::InvalidSchedule(format!("'{}' is not RFC 3339: {}", raw, e)))?;

    if at <= now {
        return Err(ValidationError::InvalidSchedule(format!(
            "'{}' is not in the future",
            raw
        )));
    }

    Ok(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let style = StyleOptions::default()
            .resolve(StyleConfig::default())
            .unwrap();
        assert_eq!(style, StyleConfig::default());
    }

    #[test]
    fn test_resolve_parses_known_values() {
        let options = StyleOptions {
            tone: Some("Bold".to_string()),
            structure: Some("question_led".to_string()),
            closing: Some("none".to_string()),
            max_length: Some(120),
        };
        let style = options.resolve(StyleConfig::default()).unwrap();
        assert_eq!(style.tone, Tone::Bold);
        assert_eq!(style.structure, Structure::QuestionLed);
        assert_eq!(style.closing, Closing::None);
        assert_eq!(style.max_length, 120);
    }

    #[test]
    fn test_resolve_rejects_unknown_tone() {
        let options = StyleOptions {
            tone: Some("sarcastic".to_string()),
            ..Default::default()
        };
        let err = options.resolve(StyleConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownOption { field: "tone", .. }
        ));
    }

    #[test]
    fn test_resolve_rejects_tiny_max_length() {
        let options = StyleOptions {
            max_length: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            options.resolve(StyleConfig::default()),
            Err(ValidationError::MaxLengthTooSmall { value: 0, .. })
        ));
    }

    #[test]
    fn test_count_must_be_two_or_three() {
        assert!(validate_count(2).is_ok());
        assert!(validate_count(3).is_ok());
        assert_eq!(validate_count(4), Err(ValidationError::InvalidCount(4)));
    }

    #[test]
    fn test_parse_schedule_accepts_future_utc_and_offset() {
        let now = datetime!(2025-01-31 12:00 UTC);
        let at = parse_schedule("2025-01-31T14:30:00Z", now).unwrap();
        assert_eq!(at, datetime!(2025-01-31 14:30 UTC));

        let offset = parse_schedule("2025-01-31T15:30:00+01:00", now).unwrap();
        assert_eq!(offset, datetime!(2025-01-31 14:30 UTC));
    }

    #[test]
    fn test_parse_schedule_rejects_past_and_naive() {
        let now = datetime!(2025-02-01 0:00 UTC);
        assert!(matches!(
            parse_schedule("2025-01-31T14:30:00Z", now),
            Err(ValidationError::InvalidSchedule(_))
        ));
        assert!(matches!(
            parse_schedule("2025-03-01T14:30:00", now),
            Err(ValidationError::InvalidSchedule(_))
        ));
        assert!(matches!(
            parse_schedule("tomorrow", now),
            Err(ValidationError::InvalidSchedule(_))
        ));
    }
}
