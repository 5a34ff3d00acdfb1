// Altrs Window Context
//
// Identity of the focused window and the rule language used to map a
// window onto one of the profile's applications.

use std::fmt;

use regex::{Regex, RegexBuilder};

use super::geometry::Rect;

/// Information about the currently focused window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowInfo {
    /// Window class/app_id (e.g., "firefox", "org.mozilla.firefox")
    pub wm_class: Option<String>,

    /// Window title (e.g., "Inbox - Mail")
    pub wm_name: Option<String>,

    /// Window rectangle in screen pixels, when known
    pub rect: Option<Rect>,
}

impl WindowInfo {
    /// Create a new empty WindowInfo
    pub fn new() -> Self {
        Self::default()
    }

    /// Create WindowInfo with class and title
    pub fn with_details(wm_class: Option<String>, wm_name: Option<String>) -> Self {
        Self {
            wm_class,
            wm_name,
            rect: None,
        }
    }

    /// Attach the window rectangle
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    /// True when class and title are the same (the rectangle may differ)
    pub fn same_identity(&self, other: &WindowInfo) -> bool {
        self.wm_class == other.wm_class && self.wm_name == other.wm_name
    }

    /// Check if the window matches a condition
    pub fn matches_condition(&self, condition: &WindowCondition) -> bool {
        match condition {
            WindowCondition::WmClassEquals(class) => {
                self.wm_class.as_ref().is_some_and(|c| c == class)
            }
            WindowCondition::WmClassMatches(pattern) => self
                .wm_class
                .as_ref()
                .is_some_and(|c| pattern.is_match(c)),
            WindowCondition::WmNameEquals(name) => {
                self.wm_name.as_ref().is_some_and(|n| n == name)
            }
            WindowCondition::WmNameMatches(pattern) => self
                .wm_name
                .as_ref()
                .is_some_and(|n| pattern.is_match(n)),
        }
    }
}

/// Case-insensitive regex compiled once, kept with its source text
#[derive(Debug, Clone)]
pub struct WindowPattern {
    source: String,
    regex: Regex,
}

impl WindowPattern {
    pub fn new(source: impl Into<String>) -> Result<Self, ConditionParseError> {
        let source = source.into();
        match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(regex) => Ok(Self { source, regex }),
            Err(e) => Err(ConditionParseError::InvalidPattern {
                pattern: source,
                reason: e.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for WindowPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for WindowPattern {}

/// Condition for matching windows
///
/// - `wm_class == "value"` - exact match
/// - `wm_class =~ "pattern"` - case-insensitive regex search
/// - `wm_name == "value"` - exact match
/// - `wm_name =~ "pattern"` - case-insensitive regex search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCondition {
    WmClassEquals(String),
    WmClassMatches(WindowPattern),
    WmNameEquals(String),
    WmNameMatches(WindowPattern),
}

/// Error parsing a window condition string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionParseError {
    #[error("Empty condition string")]
    Empty,

    #[error("Missing operator (== or =~)")]
    MissingOperator,

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Value must be quoted: {0}")]
    UnquotedValue(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl WindowCondition {
    /// Parse a condition string into a WindowCondition
    ///
    /// # Examples
    /// ```
    /// use altrs_core::window::{WindowCondition, WindowInfo};
    ///
    /// let condition = WindowCondition::parse("wm_class =~ 'Firefox'").unwrap();
    /// let info = WindowInfo::with_details(Some("org.mozilla.firefox".to_string()), None);
    /// assert!(info.matches_condition(&condition));
    /// ```
    pub fn parse(condition: &str) -> Result<Self, ConditionParseError> {
        let trimmed = condition.trim();

        if trimmed.is_empty() {
            return Err(ConditionParseError::Empty);
        }

        let (field, op, value) = if let Some(pos) = trimmed.find("==") {
            (trimmed[..pos].trim(), "==", trimmed[pos + 2..].trim())
        } else if let Some(pos) = trimmed.find("=~") {
            (trimmed[..pos].trim(), "=~", trimmed[pos + 2..].trim())
        } else {
            return Err(ConditionParseError::MissingOperator);
        };

        if field != "wm_class" && field != "wm_name" {
            return Err(ConditionParseError::InvalidField(field.to_string()));
        }

        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if !quoted {
            return Err(ConditionParseError::UnquotedValue(value.to_string()));
        }
        let value = value[1..value.len() - 1].to_string();

        Ok(match (field, op) {
            ("wm_class", "==") => WindowCondition::WmClassEquals(value),
            ("wm_class", _) => WindowCondition::WmClassMatches(WindowPattern::new(value)?),
            ("wm_name", "==") => WindowCondition::WmNameEquals(value),
            _ => WindowCondition::WmNameMatches(WindowPattern::new(value)?),
        })
    }

    /// Get the field name (wm_class or wm_name)
    pub fn field(&self) -> &'static str {
        match self {
            WindowCondition::WmClassEquals(_) | WindowCondition::WmClassMatches(_) => "wm_class",
            WindowCondition::WmNameEquals(_) | WindowCondition::WmNameMatches(_) => "wm_name",
        }
    }

    /// Get the pattern/value
    pub fn pattern(&self) -> &str {
        match self {
            WindowCondition::WmClassEquals(s) | WindowCondition::WmNameEquals(s) => s,
            WindowCondition::WmClassMatches(p) | WindowCondition::WmNameMatches(p) => p.as_str(),
        }
    }

    /// Check if this is an exact match condition
    pub fn is_exact(&self) -> bool {
        matches!(
            self,
            WindowCondition::WmClassEquals(_) | WindowCondition::WmNameEquals(_)
        )
    }
}

impl fmt::Display for WindowCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_exact() { "==" } else { "=~" };
        write!(f, "{} {} '{}'", self.field(), op, self.pattern())
    }
}
