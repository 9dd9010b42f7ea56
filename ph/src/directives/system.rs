//! Date, time and system identity directives

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use tracing::debug;
use uuid::Uuid;

use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";
const DEFAULT_TIME_FORMAT: &str = "%-I:%M:%S %p";

/// Which system value a directive reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemValue {
    Date,
    Time,
    Day,
    User,
    HomeDir,
    Hostname,
    ComputerName,
    Uuid,
    SystemLanguage,
}

impl SystemValue {
    pub const ALL: &'static [SystemValue] = &[
        Self::Date,
        Self::Time,
        Self::Day,
        Self::User,
        Self::HomeDir,
        Self::Hostname,
        Self::ComputerName,
        Self::Uuid,
        Self::SystemLanguage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Day => "day",
            Self::User => "user",
            Self::HomeDir => "homedir",
            Self::Hostname => "hostname",
            Self::ComputerName => "computerName",
            Self::Uuid => "uuid",
            Self::SystemLanguage => "systemLanguage",
        }
    }

    fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Date => &["date"],
            Self::Time => &["time"],
            Self::Day => &["day"],
            Self::User => &["user"],
            Self::HomeDir => &["homedir"],
            Self::Hostname => &["hostname"],
            Self::ComputerName => &["computerName"],
            // A fresh value per token, never memoized
            Self::Uuid => &[],
            Self::SystemLanguage => &["systemLanguage"],
        }
    }
}

pub struct SystemDirective {
    value: SystemValue,
}

impl SystemDirective {
    pub fn new(value: SystemValue) -> Self {
        Self { value }
    }

    fn resolve(&self, token: &Token) -> Result<String, DirectiveError> {
        let now = Local::now();
        let text = match self.value {
            SystemValue::Date => format_time(&now, "date", token.args.get("format").unwrap_or(DEFAULT_DATE_FORMAT))?,
            SystemValue::Time => format_time(&now, "time", token.args.get("format").unwrap_or(DEFAULT_TIME_FORMAT))?,
            SystemValue::Day => format_time(&now, "day", "%A")?,
            SystemValue::User => whoami::username(),
            SystemValue::HomeDir => dirs::home_dir()
                .ok_or_else(|| DirectiveError::unavailable("home directory"))?
                .display()
                .to_string(),
            SystemValue::Hostname => {
                whoami::fallible::hostname().map_err(|e| DirectiveError::unavailable(format!("hostname: {e}")))?
            }
            SystemValue::ComputerName => whoami::devicename(),
            SystemValue::Uuid => Uuid::new_v4().to_string(),
            SystemValue::SystemLanguage => system_language(),
        };
        Ok(text)
    }
}

/// Render `now` with a strftime `format`, rejecting specifiers chrono cannot render
fn format_time(now: &DateTime<Local>, name: &str, format: &str) -> Result<String, DirectiveError> {
    let mut out = String::new();
    write!(out, "{}", now.format(format))
        .map_err(|_| DirectiveError::malformed(name, format!("invalid format '{format}'")))?;
    Ok(out)
}

/// Preferred language tag, `en-US` style
fn system_language() -> String {
    let from_env = ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty() && v != "C" && v != "POSIX");

    match from_env {
        Some(locale) => locale.split('.').next().unwrap_or_default().replace('_', "-"),
        None => whoami::langs()
            .ok()
            .and_then(|mut langs| langs.next())
            .map(|lang| lang.to_string().replace('/', "-"))
            .unwrap_or_else(|| "en-US".to_string()),
    }
}

#[async_trait]
impl Directive for SystemDirective {
    fn name(&self) -> &str {
        self.value.name()
    }

    fn description(&self) -> &str {
        match self.value {
            SystemValue::Date => "Current date, strftime format via format=\"...\"",
            SystemValue::Time => "Current time, strftime format via format=\"...\"",
            SystemValue::Day => "Current weekday name",
            SystemValue::User => "Login name of the current user",
            SystemValue::HomeDir => "Home directory of the current user",
            SystemValue::Hostname => "Network host name",
            SystemValue::ComputerName => "User-facing computer name",
            SystemValue::Uuid => "A new random UUID",
            SystemValue::SystemLanguage => "Preferred system language",
        }
    }

    fn result_keys(&self) -> &[&'static str] {
        self.value.keys()
    }

    async fn apply(&self, token: &Token, _scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(value = ?self.value, "SystemDirective::apply: called");
        let text = self.resolve(token)?;
        // Formatted dates and times depend on the token, so only the plain form is memoized
        let memoize = token.args.is_empty() && !self.value.keys().is_empty();
        Ok(if memoize {
            DirectiveOutput::keyed(self.value.name(), text)
        } else {
            DirectiveOutput::text(text)
        })
    }
}
