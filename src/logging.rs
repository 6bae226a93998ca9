//! Caller-qualified logging on top of the `log` facade.
//!
//! Every record is emitted under an identity: either a name supplied for that
//! single call, or the call site of the log statement rendered as
//! `<module>:<function>:<line>`. The call site is captured at compile time by
//! the macros in this module, so nothing inspects the stack at runtime.
//!
//! ```ignore
//! use esp8266_skill::{debug, error};
//!
//! debug!("My message: {}", value);
//! error!(name: "custom_name"; "Another message");
//! error!(name: module_path!(); "Named after the module, like a plain logger");
//! ```

pub mod config;

use std::{error::Error as StdError, fmt, io::Write};

use chrono::{Local, NaiveTime};
use env_logger::{Builder, Env, Target};
use log::{Level, Record};
use thiserror::Error;

pub use config::{LogConfig, SYSTEM_CONFIG};

#[derive(Error, Debug)]
pub enum LogError {
    #[error("a logger is already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

impl LogConfig {
    /// Installs the shared stdout handler for every target in the process,
    /// including other crates. `RUST_LOG` takes precedence over the configured
    /// level when it is set.
    pub fn install(&self) -> Result<(), LogError> {
        let env = Env::default().default_filter_or(self.level().to_string());

        Builder::from_env(env)
            .target(Target::Stdout)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    format_line(Local::now().time(), record.target(), record.level(), record.args())
                )
            })
            .try_init()?;

        Ok(())
    }
}

/// Renders `HH:MM:SS.mmm - <identity> - <LEVEL> - <message>`.
pub fn format_line(time: NaiveTime, identity: &str, level: Level, message: &fmt::Arguments<'_>) -> String {
    format!(
        "{} - {identity} - {} - {message}",
        time.format("%H:%M:%S%.3f"),
        level_name(level)
    )
}

pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Where a log statement lives in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    module: &'static str,
    function: &'static str,
    line: u32,
}

impl CallSite {
    pub const fn new(module: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            module,
            function,
            line,
        }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn function(&self) -> &'static str {
        self.function
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.module, self.function, self.line)
    }
}

/// A single-use logger handle.
///
/// Each severity method takes `self`, so an explicit name given to
/// [`Logger::named`] applies to exactly one record. Nothing is shared between
/// handles, which keeps concurrent callers from seeing each other's names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    identity: String,
}

impl Logger {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            identity: name.into(),
        }
    }

    pub fn at(site: CallSite) -> Self {
        Self {
            identity: site.to_string(),
        }
    }

    /// Picks the explicit name when one is given, the call site otherwise.
    pub fn resolve(name: Option<&str>, site: CallSite) -> Self {
        match name {
            Some(name) => Self::named(name),
            None => Self::at(site),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn debug(self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    pub fn info(self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn warning(self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub fn error(self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    /// Logs at error severity, followed by the error and its chain of sources.
    pub fn exception<E: StdError + ?Sized>(self, err: &E, args: fmt::Arguments<'_>) {
        let trace = error_chain(err);
        self.emit(Level::Error, format_args!("{args}\n{trace}"));
    }

    fn emit(self, level: Level, args: fmt::Arguments<'_>) {
        if level > log::max_level() {
            return;
        }

        log::logger().log(
            &Record::builder()
                .args(args)
                .level(level)
                .target(&self.identity)
                .build(),
        );
    }
}

/// `err` plus one `caused by:` line per source.
pub fn error_chain<E: StdError + ?Sized>(err: &E) -> String {
    let mut rendered = format!("Error: {err}");
    let mut source = err.source();

    while let Some(cause) = source {
        rendered.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }

    rendered
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn here() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = type_name_of(here);
        let path = path.strip_suffix("::here").unwrap_or(path);
        path.rsplit("::")
            .find(|segment| *segment != "{{closure}}")
            .unwrap_or(path)
    }};
}

/// The [`CallSite`](crate::logging::CallSite) of the macro invocation.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::logging::CallSite::new(module_path!(), $crate::__function_name!(), line!())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($method:ident, name: $name:expr; $($arg:tt)+) => {
        $crate::logging::Logger::resolve(
            Some(::core::convert::AsRef::<str>::as_ref(&$name)),
            $crate::call_site!(),
        )
        .$method(format_args!($($arg)+))
    };
    ($method:ident, $($arg:tt)+) => {
        $crate::logging::Logger::resolve(None, $crate::call_site!()).$method(format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => { $crate::__log!(debug, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => { $crate::__log!(info, $($arg)+) };
}

#[macro_export]
macro_rules! warning {
    ($($arg:tt)+) => { $crate::__log!(warning, $($arg)+) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => { $crate::__log!(error, $($arg)+) };
}

/// `exception!(err, "context {}", x)` logs `err` and its sources at error
/// severity.
#[macro_export]
macro_rules! exception {
    (name: $name:expr; $err:expr, $($arg:tt)+) => {
        $crate::logging::Logger::resolve(
            Some(::core::convert::AsRef::<str>::as_ref(&$name)),
            $crate::call_site!(),
        )
        .exception(&$err, format_args!($($arg)+))
    };
    ($err:expr, $($arg:tt)+) => {
        $crate::logging::Logger::resolve(None, $crate::call_site!())
            .exception(&$err, format_args!($($arg)+))
    };
}
