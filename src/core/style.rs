//! ANSI SGR styling of console lines

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};

const ESC: &str = "\x1b[";
const RESET: &str = "\x1b[0m";

/// One SGR attribute code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Style {
    FontNone = 0,
    FontBold = 1,
    FontComment = 2,
    FontItalic = 3,
    FontUnderline = 4,
    FgBlack = 30,
    FgRed = 31,
    FgGreen = 32,
    FgYellow = 33,
    FgBlue = 34,
    FgMagenta = 35,
    FgCyan = 36,
    FgWhite = 37,
    FgDefault = 39,
    BgBlack = 40,
    BgRed = 41,
    BgGreen = 42,
    BgYellow = 43,
    BgBlue = 44,
    BgMagenta = 45,
    BgCyan = 46,
    BgWhite = 47,
    BgDefault = 49,
}

impl Style {
    pub const ALL: [Style; 23] = [
        Style::FontNone,
        Style::FontBold,
        Style::FontComment,
        Style::FontItalic,
        Style::FontUnderline,
        Style::FgBlack,
        Style::FgRed,
        Style::FgGreen,
        Style::FgYellow,
        Style::FgBlue,
        Style::FgMagenta,
        Style::FgCyan,
        Style::FgWhite,
        Style::FgDefault,
        Style::BgBlack,
        Style::BgRed,
        Style::BgGreen,
        Style::BgYellow,
        Style::BgBlue,
        Style::BgMagenta,
        Style::BgCyan,
        Style::BgWhite,
        Style::BgDefault,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Style> {
        Style::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Foreground style for one of `colored`'s basic eight colors
    ///
    /// Bright and true colors have no single SGR code in this set and yield `None`.
    #[cfg(feature = "console")]
    pub fn fg(color: colored::Color) -> Option<Style> {
        color.to_fg_str().parse::<u8>().ok().and_then(Style::from_code)
    }

    /// Background counterpart of [`Style::fg`]
    #[cfg(feature = "console")]
    pub fn bg(color: colored::Color) -> Option<Style> {
        color.to_bg_str().parse::<u8>().ok().and_then(Style::from_code)
    }
}

/// Wrap `message` as `ESC[c1;c2;...m<message>ESC[0m`
///
/// Codes are emitted in the order given. An empty style list leaves the
/// message untouched.
pub fn apply_style(message: &str, styles: &[Style]) -> String {
    if styles.is_empty() {
        return message.to_string();
    }

    let codes = styles
        .iter()
        .map(|s| s.code().to_string())
        .collect::<Vec<_>>()
        .join(";");

    let mut out = String::with_capacity(message.len() + codes.len() + ESC.len() + RESET.len() + 1);
    out.push_str(ESC);
    out.push_str(&codes);
    out.push('m');
    out.push_str(message);
    out.push_str(RESET);
    out
}

/// Style lists for every level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSet {
    pub info: Vec<Style>,
    pub warn: Vec<Style>,
    pub error: Vec<Style>,
    pub debug: Vec<Style>,
    pub panic: Vec<Style>,
    pub fatal: Vec<Style>,
}

impl StyleSet {
    /// No styling for any level
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn default_styles() -> Self {
        Self {
            info: vec![Style::FgWhite],
            warn: vec![Style::FgYellow],
            error: vec![Style::FgRed],
            debug: vec![Style::FontItalic, Style::FontComment],
            panic: vec![Style::FontBold, Style::FgBlack, Style::BgMagenta],
            fatal: vec![Style::FontBold, Style::FgBlack, Style::BgRed],
        }
    }

    pub fn get(&self, level: LogLevel) -> &[Style] {
        match level {
            LogLevel::Info => &self.info,
            LogLevel::Warn => &self.warn,
            LogLevel::Error => &self.error,
            LogLevel::Debug => &self.debug,
            LogLevel::Panic => &self.panic,
            LogLevel::Fatal => &self.fatal,
        }
    }

    pub fn set(&mut self, level: LogLevel, styles: &[Style]) {
        let slot = match level {
            LogLevel::Info => &mut self.info,
            LogLevel::Warn => &mut self.warn,
            LogLevel::Error => &mut self.error,
            LogLevel::Debug => &mut self.debug,
            LogLevel::Panic => &mut self.panic,
            LogLevel::Fatal => &mut self.fatal,
        };
        *slot = styles.to_vec();
    }

    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, level: LogLevel, styles: &[Style]) -> Self {
        self.set(level, styles);
        self
    }
}
