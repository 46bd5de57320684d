use std::sync::OnceLock;

/// Receives every message logged through [`err!`](crate::err).
pub type ErrorSink = Box<dyn Fn(String) + Send + Sync>;

static ERROR_SINK: OnceLock<ErrorSink> = OnceLock::new();

#[macro_export]
macro_rules! ok_or_break {
    ($expression:expr) => {
        match $expression {
            Ok(v) => v,
            Err(_) => break,
        }
    };
}

#[macro_export]
macro_rules! err {
    ($($t:tt)*) => {{
        use $crate::macros::handle_log;
        let msg = format!($($t)*);
        tracing::error!("{}", &msg);

        handle_log(format!("Error: ```{}```", msg));
    }}
}

/// Installs the process-wide error sink. Only the first call has any effect; returns whether
/// this call installed the sink.
pub fn set_error_sink(sink: ErrorSink) -> bool {
    ERROR_SINK.set(sink).is_ok()
}

pub fn handle_log(message: String) {
    if let Some(sink) = ERROR_SINK.get() {
        sink(message);
    }
}
