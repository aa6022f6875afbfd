//! Story lifetime tokens and expiring-window resolution.
//!
//! A story's time-to-live is chosen at creation from a closed set of named
//! lifetime tokens and resolved once into an absolute expiry instant. The
//! expiry is never recomputed afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Named story lifetime.
///
/// Unknown tokens degrade to [`StoryLifetime::OneWeek`] instead of failing;
/// a malformed-but-recoverable request should not hard-fail the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryLifetime {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "3h")]
    ThreeHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    /// The fallback when a request omits or garbles the token.
    #[default]
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "2w")]
    TwoWeeks,
    /// Fixed at exactly 30 days; calendar-month semantics are not used.
    #[serde(rename = "1m")]
    OneMonth,
}

impl StoryLifetime {
    /// Parse a lifetime token, falling back to one week for unknown tokens.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "1h" => Self::OneHour,
            "3h" => Self::ThreeHours,
            "6h" => Self::SixHours,
            "12h" => Self::TwelveHours,
            "1d" => Self::OneDay,
            "3d" => Self::ThreeDays,
            "2w" => Self::TwoWeeks,
            "1m" => Self::OneMonth,
            // "1w" and anything unrecognized
            _ => Self::OneWeek,
        }
    }

    /// The fixed duration this token denotes.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::OneHour => Duration::hours(1),
            Self::ThreeHours => Duration::hours(3),
            Self::SixHours => Duration::hours(6),
            Self::TwelveHours => Duration::hours(12),
            Self::OneDay => Duration::days(1),
            Self::ThreeDays => Duration::days(3),
            Self::OneWeek => Duration::weeks(1),
            Self::TwoWeeks => Duration::weeks(2),
            Self::OneMonth => Duration::days(30),
        }
    }

    /// Resolve the absolute expiry instant for a story created at `reference`.
    #[must_use]
    pub fn expires_at(self, reference: DateTime<Utc>) -> DateTime<Utc> {
        reference + self.duration()
    }
}

impl<'de> Deserialize<'de> for StoryLifetime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(Self::parse(&token))
    }
}

/// Bounded future interval used to filter stories about to expire.
///
/// Unknown tokens degrade to [`ExpiryWindow::Day`], mirroring the lifetime
/// fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryWindow {
    Hour,
    Day,
    Week,
}

impl ExpiryWindow {
    /// Parse a window token, falling back to a day for unknown tokens.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "hour" => Self::Hour,
            "week" => Self::Week,
            _ => Self::Day,
        }
    }

    /// The fixed duration this window spans.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
            Self::Week => Duration::weeks(1),
        }
    }
}

impl<'de> Deserialize<'de> for ExpiryWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(Self::parse(&token))
    }
}
