//! Process-wide logging setup shared by the binaries.

pub mod tracing;

pub use self::tracing::LogFormat;

/// Install the global subscriber. Repeated calls are no-ops.
pub fn init() {
    self::tracing::init(LogFormat::from_env());
}
