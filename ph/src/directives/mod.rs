//! Built-in directives and the static tier tables the registry is built from

mod calendar;
mod desktop;
mod interactive;
mod meta;
mod readers;
mod scripts;
mod system;
mod variables;
mod weather;

use std::sync::Arc;

use crate::directive::DirectiveRef;
use crate::error::DirectiveError;
use crate::flow;
use crate::grammar::Token;

pub use calendar::CalendarWindow;
pub use system::SystemValue;
pub use variables::VariableOp;

/// Persistent-variable mutations, then reads
pub fn high_precedence() -> Vec<DirectiveRef> {
    VariableOp::ALL
        .iter()
        .map(|op| Arc::new(variables::VariableDirective::new(*op)) as DirectiveRef)
        .collect()
}

/// Pure reads of host, system and network state
pub fn informational() -> Vec<DirectiveRef> {
    let mut table: Vec<DirectiveRef> = vec![
        Arc::new(desktop::ClipboardText),
        Arc::new(desktop::SelectedText),
        Arc::new(desktop::SelectedFiles),
        Arc::new(desktop::SelectedFileContents),
        Arc::new(desktop::CurrentApplication),
        Arc::new(desktop::CurrentUrl),
        Arc::new(desktop::CurrentTabText),
        Arc::new(desktop::Input),
    ];
    table.extend(
        desktop::SEEDED
            .iter()
            .map(|&(name, description)| Arc::new(desktop::Seeded::new(name, description)) as DirectiveRef),
    );
    table.extend(
        SystemValue::ALL
            .iter()
            .map(|v| Arc::new(system::SystemDirective::new(*v)) as DirectiveRef),
    );
    table.extend(
        CalendarWindow::ALL
            .iter()
            .map(|w| Arc::new(calendar::CalendarEvents::new(*w)) as DirectiveRef),
    );
    table.push(Arc::new(weather::Location));
    table.push(Arc::new(weather::Weather::current()));
    table.push(Arc::new(weather::Weather::week()));
    table
}

/// Flow control, readers, dialogs, scripts, then meta directives
pub fn low_precedence() -> Vec<DirectiveRef> {
    let mut table = flow::directives();
    table.push(Arc::new(readers::FileReader));
    table.push(Arc::new(readers::UrlReader));
    table.push(Arc::new(interactive::Alert));
    table.push(Arc::new(interactive::Dialog));
    table.push(Arc::new(interactive::Say));
    table.extend(
        scripts::SCRIPT_DIRECTIVES
            .iter()
            .map(|&(name, description)| Arc::new(scripts::ScriptDirective::new(name, description)) as DirectiveRef),
    );
    table.push(Arc::new(meta::Ignore));
    table.push(Arc::new(meta::Cutoff));
    table
}

/// Fail with `LookupUnavailable` off macOS
pub(crate) fn require_macos(what: &str) -> Result<(), DirectiveError> {
    if cfg!(target_os = "macos") {
        Ok(())
    } else {
        Err(DirectiveError::unavailable(format!("{what} needs macOS")))
    }
}

/// The body, or the first positional argument when there is no body
pub(crate) fn operand(token: &Token) -> Option<&str> {
    token
        .body
        .as_deref()
        .or_else(|| token.args.positional(0))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::find_first;

    #[test]
    fn test_operand_prefers_body() {
        let token = find_first("{{increment:hits}}", "increment").unwrap();
        assert_eq!(operand(&token), Some("hits"));

        let token = find_first("{{increment hits}}", "increment").unwrap();
        assert_eq!(operand(&token), Some("hits"));

        let token = find_first("{{increment}}", "increment").unwrap();
        assert_eq!(operand(&token), None);
    }

    #[test]
    fn test_tables_are_populated() {
        assert_eq!(high_precedence().len(), VariableOp::ALL.len());
        assert!(informational().iter().any(|d| d.name() == "weekWeather"));
        let low = low_precedence();
        assert_eq!(low.last().map(|d| d.name().to_string()).as_deref(), Some("cutoff"));
    }
}
