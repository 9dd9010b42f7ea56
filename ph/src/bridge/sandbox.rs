//! In-process sandbox for `{{js:...}}` bodies
//!
//! Scripts run in a Rhai engine. Rhai has no file, network or process
//! access of its own; the only way out is the host function table below,
//! each entry of which re-enters a built-in directive by name. Limits:
//!
//! - wall clock (`sandbox-timeout-ms`), checked on every operation and again
//!   around the whole evaluation
//! - operation count (`sandbox-max-operations`, 0 = unlimited)
//! - call depth and string size
//!
//! A script that throws, times out or hits a limit yields an error; the
//! directive boundary turns that into an empty result.

use rhai::{Dynamic, Engine, EvalAltResult};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::context::Context;
use crate::directive::{Environment, Scope};
use crate::error::ScriptError;
use crate::grammar::{DirectiveArgs, Token};

/// Extra time the outer guard allows over the in-engine limit
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

const MAX_CALL_LEVELS: usize = 32;
const MAX_STRING_SIZE: usize = 1_000_000;

/// Host functions available to sandboxed scripts, with the directive each one calls
pub const SANDBOX_FUNCTIONS: &[(&str, &str)] = &[
    ("clipboard_text()", "clipboardText"),
    ("selected_text()", "selectedText"),
    ("current_app()", "currentApplication"),
    ("current_url()", "currentURL"),
    ("date() / date(format)", "date"),
    ("time()", "time"),
    ("shell(script) / shell(bin, script)", "shell"),
    ("applescript(script)", "applescript"),
    ("jxa(script)", "jxa"),
    ("get_var(name)", "get"),
    ("set_var(name, value)", "set"),
    ("reset_var(name)", "reset"),
    ("delete_var(name)", "delete"),
    ("increment(id)", "increment"),
    ("decrement(id)", "decrement"),
    ("vars()", "vars"),
    ("log(message)", "-"),
];

/// Zero-argument host functions and the directive behind each
const READERS: &[(&str, &str)] = &[
    ("clipboard_text", "clipboardText"),
    ("selected_text", "selectedText"),
    ("current_app", "currentApplication"),
    ("current_url", "currentURL"),
    ("date", "date"),
    ("time", "time"),
    ("vars", "vars"),
];

/// Evaluate `script` in the sandbox
pub(super) async fn evaluate(script: &str, scope: &Scope<'_>) -> Result<String, ScriptError> {
    let settings = scope.env.bridge().settings();
    let timeout_ms = settings.sandbox_timeout_ms;
    let max_operations = settings.sandbox_max_operations;
    debug!(script_len = script.len(), %timeout_ms, %max_operations, "sandbox::evaluate: called");

    let host = Host {
        env: scope.env.clone(),
        context: scope.context.clone(),
        handle: Handle::current(),
    };
    let script = script.to_string();
    let limit = Duration::from_millis(timeout_ms);

    let task = tokio::task::spawn_blocking(move || run_blocking(&script, host, limit, max_operations));

    match tokio::time::timeout(limit + TIMEOUT_GRACE, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(ScriptError::Join(e.to_string())),
        Err(_) => {
            debug!("sandbox::evaluate: outer timeout elapsed");
            Err(ScriptError::Timeout { timeout_ms })
        }
    }
}

/// Host state the registered functions call back into
struct Host {
    env: Environment,
    context: Context,
    handle: Handle,
}

impl Host {
    /// Apply the built-in directive `name` and return its result text
    fn call(&self, name: &str, args: DirectiveArgs, body: Option<String>) -> String {
        debug!(%name, "Host::call: called");
        let Some(directive) = self.env.registry().get(name).cloned() else {
            debug!(%name, "Host::call: no such directive");
            return String::new();
        };
        let token = Token::synthetic(name, args, body);
        let scope = Scope::new(&self.context, &self.env);
        match self.handle.block_on(directive.apply(&token, &scope)) {
            Ok(output) => output.result,
            Err(e) => {
                debug!(%name, error = %e, "Host::call: directive failed");
                String::new()
            }
        }
    }
}

fn positional(values: &[&str]) -> DirectiveArgs {
    DirectiveArgs {
        positional: values.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

fn run_blocking(script: &str, host: Host, limit: Duration, max_operations: u64) -> Result<String, ScriptError> {
    let mut engine = Engine::new();

    let started = Instant::now();
    engine.on_progress(move |_| {
        if started.elapsed() > limit {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });
    if max_operations > 0 {
        engine.set_max_operations(max_operations);
    }
    engine.set_max_call_levels(MAX_CALL_LEVELS);
    engine.set_max_string_size(MAX_STRING_SIZE);
    engine.disable_symbol("eval");

    engine.on_print(|text| info!(target: "placeholders::sandbox", "{text}"));
    engine.on_debug(|text, _source, _pos| debug!(target: "placeholders::sandbox", "{text}"));
    engine.register_fn("log", |message: &str| {
        info!(target: "placeholders::sandbox", "{message}");
    });

    register_host_functions(&mut engine, Rc::new(host));

    match engine.eval::<Dynamic>(script) {
        Ok(value) => Ok(dynamic_to_text(value)),
        Err(err) => match *err {
            EvalAltResult::ErrorTerminated(..) => Err(ScriptError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            }),
            other => Err(ScriptError::Sandbox(other.to_string())),
        },
    }
}

fn register_host_functions(engine: &mut Engine, host: Rc<Host>) {
    for &(function, directive) in READERS {
        let h = host.clone();
        engine.register_fn(function, move || h.call(directive, DirectiveArgs::default(), None));
    }

    let h = host.clone();
    engine.register_fn("date", move |format: &str| {
        let mut args = DirectiveArgs::default();
        args.named.insert("format".to_string(), format.to_string());
        h.call("date", args, None)
    });

    let h = host.clone();
    engine.register_fn("shell", move |script: &str| h.call("shell", DirectiveArgs::default(), Some(script.to_string())));
    let h = host.clone();
    engine.register_fn("shell", move |bin: &str, script: &str| {
        h.call("shell", positional(&[bin]), Some(script.to_string()))
    });

    let h = host.clone();
    engine.register_fn("applescript", move |script: &str| {
        h.call("applescript", DirectiveArgs::default(), Some(script.to_string()))
    });
    let h = host.clone();
    engine.register_fn("jxa", move |script: &str| h.call("jxa", DirectiveArgs::default(), Some(script.to_string())));

    let h = host.clone();
    engine.register_fn("get_var", move |name: &str| h.call("get", positional(&[name]), None));
    let h = host.clone();
    engine.register_fn("set_var", move |name: &str, value: &str| {
        h.call("set", positional(&[name]), Some(value.to_string()));
    });
    let h = host.clone();
    engine.register_fn("reset_var", move |name: &str| h.call("reset", positional(&[name]), None));
    let h = host.clone();
    engine.register_fn("delete_var", move |name: &str| {
        h.call("delete", positional(&[name]), None);
    });
    let h = host.clone();
    engine.register_fn("increment", move |id: &str| h.call("increment", DirectiveArgs::default(), Some(id.to_string())));
    let h = host;
    engine.register_fn("decrement", move |id: &str| h.call("decrement", DirectiveArgs::default(), Some(id.to_string())));
}

fn dynamic_to_text(value: Dynamic) -> String {
    if value.is_unit() {
        String::new()
    } else {
        value.to_string()
    }
}
