use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form unit label attached to a metric, sent as the item's `units`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(String);

impl Unit {
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn percent() -> Self {
        Self("%".to_string())
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Unit {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Time unit used for meter rates and timer durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Short label used as the item unit, e.g. `"ms"`.
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "days",
        }
    }

    pub fn unit(&self) -> Unit {
        Unit::custom(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_labels() {
        assert_eq!(TimeUnit::Milliseconds.unit().as_str(), "ms");
        assert_eq!(TimeUnit::Minutes.label(), "min");
        assert_eq!(TimeUnit::default(), TimeUnit::Seconds);
    }

    #[test]
    fn test_builtin_units() {
        assert_eq!(Unit::none().as_str(), "");
        assert_eq!(Unit::percent().to_string(), "%");
    }
}
