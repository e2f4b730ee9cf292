use std::fmt::Display;

/// Turns a `Result` into an `Option`, logging the error.
///
/// Used on paths where a failure is reported but must not stop the caller, e.g. a single
/// failed housekeeping tick.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self, level: log::Level, context: impl Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, level: log::Level, context: impl Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(level, "{context}: {err}");
                None
            }
        }
    }
}
