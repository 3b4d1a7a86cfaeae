use super::config::LogLevel;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("Invalid log level '{input}'. Valid levels: error, warn, info, debug, trace")]
    InvalidLogLevel { input: String },

    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },

    #[error("Empty target in directive '{input}'")]
    EmptyTarget { input: String },

    #[error("Logging system initialization failed: {details}")]
    LoggingInitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl InitializationError {
    pub fn fallback_strategy(&self) -> FallbackStrategy {
        match self {
            InitializationError::InvalidLogLevel { .. } => FallbackStrategy::UseDefaultLevel,
            InitializationError::InvalidDirectiveFormat { .. }
            | InitializationError::EmptyTarget { .. } => FallbackStrategy::SkipDirective,
            InitializationError::LoggingInitFailed { .. } => FallbackStrategy::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    UseDefaultLevel,
    SkipDirective,
    Abort,
}

/// Per-target level override, e.g. `reqwest=warn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(directive: &str) -> Result<Self, InitializationError> {
        let Some((target, level)) = directive.split_once('=') else {
            return Err(InitializationError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        };
        if level.contains('=') {
            return Err(InitializationError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        }

        let target = target.trim();
        if target.is_empty() {
            return Err(InitializationError::EmptyTarget {
                input: directive.to_string(),
            });
        }

        let level = LogLevel::from_str(level.trim()).map_err(|_| {
            InitializationError::InvalidLogLevel {
                input: level.trim().to_string(),
            }
        })?;

        Ok(LogDirective::new(target, level))
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive_parsing_valid_cases() {
        let valid_cases = [
            ("hyper=warn", "hyper", LogLevel::Warn),
            ("reqwest=error", "reqwest", LogLevel::Error),
            (" zabbix_reporter = DEBUG ", "zabbix_reporter", LogLevel::Debug),
        ];

        for (input, target, level) in valid_cases {
            let directive = LogDirective::parse(input).unwrap();
            assert_eq!(directive.target, target);
            assert_eq!(directive.level, level);
        }
    }

    #[test]
    fn test_log_directive_parsing_invalid_cases() {
        let invalid_cases = [
            ("", FallbackStrategy::SkipDirective),
            ("hyper", FallbackStrategy::SkipDirective),
            ("=warn", FallbackStrategy::SkipDirective),
            ("hyper=warn=extra", FallbackStrategy::SkipDirective),
            ("hyper=loud", FallbackStrategy::UseDefaultLevel),
            ("hyper=", FallbackStrategy::UseDefaultLevel),
        ];

        for (input, strategy) in invalid_cases {
            let error = LogDirective::parse(input).unwrap_err();
            assert_eq!(error.fallback_strategy(), strategy, "input: {input}");
        }
    }

    #[test]
    fn test_log_directive_to_filter_string() {
        let directive = LogDirective::new("hyper", LogLevel::Warn);
        assert_eq!(directive.to_filter_string(), "hyper=warn");
    }
}
