//! Browser scripting support
//!
//! Browsers expose the active tab to automation scripting in one of two
//! dialects. Everything else is treated as "not a browser".

/// How a browser exposes its active tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    /// Safari and Safari Technology Preview: `current tab of front window`
    Safari,
    /// Chromium-based browsers: `active tab of front window`
    Chromium,
}

const SAFARI_NAMES: &[&str] = &["Safari", "Safari Technology Preview"];

const CHROMIUM_NAMES: &[&str] = &[
    "Google Chrome",
    "Google Chrome Beta",
    "Google Chrome Canary",
    "Chromium",
    "Arc",
    "Brave Browser",
    "Microsoft Edge",
    "Vivaldi",
    "Opera",
    "Orion",
];

impl BrowserFamily {
    /// Family of the application called `app`, if it is a supported browser
    pub fn of(app: &str) -> Option<Self> {
        if SAFARI_NAMES.contains(&app) {
            Some(Self::Safari)
        } else if CHROMIUM_NAMES.contains(&app) {
            Some(Self::Chromium)
        } else {
            None
        }
    }
}

/// Escape text for use inside an AppleScript string literal
pub fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// AppleScript that returns the active tab's URL of `app`
pub fn url_script(app: &str) -> Option<String> {
    let app_name = escape_applescript(app);
    match BrowserFamily::of(app)? {
        BrowserFamily::Safari => Some(format!(
            "tell application \"{app_name}\" to return URL of current tab of front window"
        )),
        BrowserFamily::Chromium => Some(format!(
            "tell application \"{app_name}\" to return URL of active tab of front window"
        )),
    }
}

/// AppleScript that runs `javascript` in the active tab of `app` and returns its result
pub fn javascript_script(app: &str, javascript: &str) -> Option<String> {
    let app_name = escape_applescript(app);
    let code = escape_applescript(javascript);
    match BrowserFamily::of(app)? {
        BrowserFamily::Safari => Some(format!(
            "tell application \"{app_name}\" to do JavaScript \"{code}\" in current tab of front window"
        )),
        BrowserFamily::Chromium => Some(format!(
            "tell application \"{app_name}\" to execute active tab of front window javascript \"{code}\""
        )),
    }
}
