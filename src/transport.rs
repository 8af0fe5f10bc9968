//! Output batching contract between the driver and the consuming transport.

/// Scoped write batching.
///
/// The driver opens exactly one buffered scope per tick and resumes the
/// whole frame tree inside it. Implementations batch whatever the frames
/// wrote during the scope and commit the batch when the scope closes; the
/// commit must happen on every exit path, including when `body` reports an
/// error. Scopes are never nested.
pub trait Transport {
    /// Runs `body` with buffering enabled, committing the batch on exit.
    fn buffered<R>(&mut self, body: impl FnOnce() -> R) -> R;
}

/// Transport with nothing to batch; every scope is a plain call.
///
/// For frames that write through their own channels, and for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn buffered<R>(&mut self, body: impl FnOnce() -> R) -> R {
        body()
    }
}
