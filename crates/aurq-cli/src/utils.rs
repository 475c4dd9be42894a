use std::{
    fmt::Display,
    sync::{LazyLock, PoisonError, RwLock},
};

use chrono::DateTime;
use nu_ansi_term::Color;

pub struct Icons;

impl Icons {
    pub const CALENDAR: &str = "📅";
    pub const DEPENDS: &str = "🔗";
    pub const DESCRIPTION: &str = "📝";
    pub const HOME: &str = "🏠";
    pub const LICENSE: &str = "📜";
    pub const LINK: &str = "🌐";
    pub const MAINTAINER: &str = "👤";
    pub const PACKAGE: &str = "📦";
    pub const VERSION: &str = "🏁";
    pub const VOTES: &str = "👍";
    pub const WARNING: &str = "⚠";
}

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn set_color(enabled: bool) {
    *COLOR.write().unwrap_or_else(PoisonError::into_inner) = enabled;
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = *COLOR.read().unwrap_or_else(PoisonError::into_inner);
        if color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Formats a unix timestamp as a UTC date, or `-` when out of range.
pub fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|date| date.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Splits a `Name: value` header argument.
pub fn split_header(header: &str) -> Option<(&str, &str)> {
    let (key, value) = header.split_once(':')?;
    let key = key.trim();
    (!key.is_empty()).then_some((key, value.trim()))
}
