use core::time::Duration;

/// Per-paginator override of the client timeout.
///
/// - `Inherit`: keep the client's configured timeout.
/// - `Clear`: no timeout for this paginator's requests.
/// - `Set(d)`: force `d`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum TimeoutOverride {
    #[default]
    Inherit,
    Clear,
    Set(Duration),
}

impl TimeoutOverride {
    #[inline]
    pub fn resolve(self, inherited: Option<Duration>) -> Option<Duration> {
        match self {
            TimeoutOverride::Inherit => inherited,
            TimeoutOverride::Clear => None,
            TimeoutOverride::Set(d) => Some(d),
        }
    }
}
