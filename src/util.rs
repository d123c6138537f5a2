//! Small helpers shared across the handshake and frame I/O machinery.

use std::io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult};

/// Converts a blocking-style I/O result into one where `WouldBlock`/
/// `Interrupted` collapse to `Ok(None)` instead of propagating as an error,
/// so callers retrying a non-blocking stream can tell "no progress yet"
/// apart from a real failure.
pub trait NonBlockingResult {
    /// The success value once progress was made.
    type Result;

    /// Turn `WouldBlock` into `Ok(None)`, leave other outcomes untouched.
    fn no_block(self) -> IoResult<Option<Self::Result>>;
}

impl<T> NonBlockingResult for IoResult<T> {
    type Result = T;

    fn no_block(self) -> IoResult<Option<T>> {
        match self {
            Ok(x) => Ok(Some(x)),
            Err(e) if e.kind() == IoErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}
