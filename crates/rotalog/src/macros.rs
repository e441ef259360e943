//! Level macros taking any number of `Display` arguments, joined by spaces

/// Log at INFO: `log_info!(logger, "user", id, "connected")`
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $logger.info($crate::join_args(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log at WARN
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $logger.warn($crate::join_args(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log at DEBUG
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $logger.debug($crate::join_args(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log at ERROR; ends the process unless `exit_on_error` is off
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:expr),+ $(,)?) => {
        $logger.error($crate::join_args(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}
