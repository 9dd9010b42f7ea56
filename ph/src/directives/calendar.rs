//! Calendar event directives: `{{todayEvents}}`, `{{weekEvents}}`, `{{monthEvents}}`, `{{yearEvents}}`

use async_trait::async_trait;
use tracing::debug;

use super::require_macos;
use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// How far ahead a calendar directive looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarWindow {
    Today,
    Week,
    Month,
    Year,
}

impl CalendarWindow {
    pub const ALL: &'static [CalendarWindow] = &[Self::Today, Self::Week, Self::Month, Self::Year];

    pub fn name(self) -> &'static str {
        match self {
            Self::Today => "todayEvents",
            Self::Week => "weekEvents",
            Self::Month => "monthEvents",
            Self::Year => "yearEvents",
        }
    }

    fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Today => &["todayEvents"],
            Self::Week => &["weekEvents"],
            Self::Month => &["monthEvents"],
            Self::Year => &["yearEvents"],
        }
    }

    fn days(self) -> u32 {
        match self {
            Self::Today => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// Automation script listing events from today's midnight through the window
    fn script(self) -> String {
        format!(
            r#"
set startDate to current date
set time of startDate to 0
set endDate to startDate + ({days} * days)
set output to ""
tell application "Calendar"
    repeat with cal in calendars
        set evs to (every event of cal whose start date is greater than or equal to startDate and start date is less than endDate)
        repeat with ev in evs
            set output to output & (summary of ev) & " | " & ((start date of ev) as text) & " | " & ((end date of ev) as text) & linefeed
        end repeat
    end repeat
end tell
return output"#,
            days = self.days()
        )
    }
}

pub struct CalendarEvents {
    window: CalendarWindow,
}

impl CalendarEvents {
    pub fn new(window: CalendarWindow) -> Self {
        Self { window }
    }
}

#[async_trait]
impl Directive for CalendarEvents {
    fn name(&self) -> &str {
        self.window.name()
    }

    fn description(&self) -> &str {
        match self.window {
            CalendarWindow::Today => "Calendar events for today",
            CalendarWindow::Week => "Calendar events for the next 7 days",
            CalendarWindow::Month => "Calendar events for the next 30 days",
            CalendarWindow::Year => "Calendar events for the next 365 days",
        }
    }

    fn result_keys(&self) -> &[&'static str] {
        self.window.keys()
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, _token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(window = ?self.window, "CalendarEvents::apply: called");
        require_macos(self.window.name())?;
        let listing = scope.env.bridge().applescript(&self.window.script()).await?;
        Ok(DirectiveOutput::keyed(self.window.name(), listing))
    }
}
