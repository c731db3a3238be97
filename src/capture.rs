//! Panic capture for target invocations.
//!
//! A process-wide panic hook is installed once. On threads currently running a
//! target function it records the panic location and a backtrace taken at the
//! panic site, and prints nothing; everywhere else it defers to the hook that was
//! installed before it.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::AssertUnwindSafe;
use std::sync::Once;

pub type PanicPayload = Box<dyn Any + Send + 'static>;

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "<unknown location>".to_string());
            let trace = format!("at {location}\n{}", Backtrace::force_capture());
            PANIC_TRACE.with(|t| *t.borrow_mut() = Some(trace));
        }));
    });
}

/// A panic caught while running a target function.
pub struct CaughtPanic {
    pub payload: PanicPayload,
    /// Panic location plus the backtrace captured where the panic was raised.
    pub trace: String,
}

impl CaughtPanic {
    pub fn message(&self) -> String {
        if let Some(s) = self.payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = self.payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        }
    }
}

/// Call `f`, catching any panic together with its panic-site trace.
pub fn try_call<O, F: FnOnce() -> O>(f: F) -> Result<O, CaughtPanic> {
    install_hook();
    let was_capturing = CAPTURING.with(|c| c.replace(true));
    PANIC_TRACE.with(|t| t.borrow_mut().take());
    let result = std::panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|c| c.set(was_capturing));
    result.map_err(|payload| {
        let trace = PANIC_TRACE
            .with(|t| t.borrow_mut().take())
            .unwrap_or_else(|| "panic trace unavailable".to_string());
        CaughtPanic { payload, trace }
    })
}
