//! Compile-time error reporting.
//!
//! Invariant violations inside the compiler are *internal* errors; requests
//! whose resource bounds cannot be honoured are *user* errors. Both are fatal
//! and are routed through a process-wide [`CompileTimeErrorReporter`]. The
//! default reporter writes the message to stderr and unwinds, so callers that
//! must survive a failing pass can `catch_unwind` around it, and tests can
//! assert on the panic message.

use std::fmt;

use parking_lot::RwLock;
use snafu::Snafu;

/// Diagnostic severity classes surfaced to reporters.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum Error {
    /// An invariant was violated by the caller of an IR constructor or by a
    /// pass. Never expected to be caught and retried.
    #[snafu(display("{msg}"))]
    Internal { msg: String },

    /// A well-formed request whose resource bounds cannot be honoured.
    #[snafu(display("{msg}"))]
    User { msg: String },
}

/// Receiver for compile-time warnings and errors.
///
/// `error` must not return; if a custom reporter's `error` does return, the
/// calling thread panics anyway.
pub trait CompileTimeErrorReporter: Send + Sync {
    fn warning(&self, msg: &str);
    fn error(&self, msg: &str);
}

struct DefaultReporter;

impl CompileTimeErrorReporter for DefaultReporter {
    fn warning(&self, msg: &str) {
        eprintln!("{msg}");
    }

    fn error(&self, msg: &str) {
        eprintln!("{msg}");
        panic!("{msg}");
    }
}

static REPORTER: RwLock<&'static (dyn CompileTimeErrorReporter)> =
    RwLock::new(&DefaultReporter);

/// Install a custom reporter. The reporter must stay valid for the rest of
/// the process, hence the `'static` bound.
pub fn set_custom_compile_time_error_reporter(
    reporter: &'static dyn CompileTimeErrorReporter,
) {
    *REPORTER.write() = reporter;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    InternalError,
    UserError,
    UserWarning,
}

/// Format and deliver a diagnostic. Not called directly; use the
/// `internal_assert!` / `internal_error!` / `user_assert!` / `user_error!` /
/// `user_warning!` macros, which capture file, line and the failed condition.
pub fn report(
    file: &'static str,
    line: u32,
    condition: Option<&'static str>,
    severity: Severity,
    tail: fmt::Arguments<'_>,
) {
    let mut msg = match severity {
        Severity::InternalError => {
            format!("Internal error at {file}:{line}\n")
        }
        Severity::UserError => "Error:\n".to_string(),
        Severity::UserWarning => "Warning:\n".to_string(),
    };
    if let Some(cond) = condition {
        msg.push_str(&format!("Condition failed: {cond}\n"));
    }
    msg.push_str(&tail.to_string());

    let reporter = *REPORTER.read();
    match severity {
        Severity::UserWarning => reporter.warning(&msg),
        Severity::InternalError => {
            let err = Error::Internal { msg };
            reporter.error(&err.to_string());
            panic!("CompileTimeErrorReporter::error returned: {err}");
        }
        Severity::UserError => {
            let err = Error::User { msg };
            reporter.error(&err.to_string());
            panic!("CompileTimeErrorReporter::error returned: {err}");
        }
    }
}

/// Fatal internal diagnostic with a formatted message tail.
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {{
        $crate::diag::report(
            file!(),
            line!(),
            None,
            $crate::diag::Severity::InternalError,
            format_args!($($arg)*),
        );
        unreachable!()
    }};
}

/// Check an internal invariant; violation is a fatal internal diagnostic.
#[macro_export]
macro_rules! internal_assert {
    ($cond:expr) => {
        $crate::internal_assert!($cond, "")
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::diag::report(
                file!(),
                line!(),
                Some(stringify!($cond)),
                $crate::diag::Severity::InternalError,
                format_args!($($arg)*),
            );
        }
    };
}

/// Fatal user-attributed diagnostic.
#[macro_export]
macro_rules! user_error {
    ($($arg:tt)*) => {{
        $crate::diag::report(
            file!(),
            line!(),
            None,
            $crate::diag::Severity::UserError,
            format_args!($($arg)*),
        );
        unreachable!()
    }};
}

/// Check a user-facing precondition; violation is a fatal user diagnostic.
#[macro_export]
macro_rules! user_assert {
    ($cond:expr) => {
        $crate::user_assert!($cond, "")
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::diag::report(
                file!(),
                line!(),
                Some(stringify!($cond)),
                $crate::diag::Severity::UserError,
                format_args!($($arg)*),
            );
        }
    };
}

/// Advisory warning routed through the reporter.
#[macro_export]
macro_rules! user_warning {
    ($($arg:tt)*) => {
        $crate::diag::report(
            file!(),
            line!(),
            None,
            $crate::diag::Severity::UserWarning,
            format_args!($($arg)*),
        )
    };
}
