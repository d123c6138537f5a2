//! Conversions between `httparse`'s zero-copy parsed headers and `http`'s
//! owned `HeaderMap`.

use crate::error::{Error, ProtocolError, Result};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Limit on the number of headers `httparse` will parse. Chosen generously
/// above what any real handshake request/response needs, to bound the
/// attack surface of a peer sending an enormous header block.
pub const MAX_HEADERS: usize = 124;

/// Converts a type from its `httparse` representation.
pub trait FromHttparse<T>: Sized {
    /// Convert a parsed `httparse` value into `Self`.
    fn from_httparse(raw: T) -> Result<Self>;
}

impl<'b: 'h, 'h> FromHttparse<&'b [httparse::Header<'h>]> for HeaderMap {
    fn from_httparse(raw: &'b [httparse::Header<'h>]) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for header in raw {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| {
                Error::Protocol(ProtocolError::InvalidHeader(HeaderName::from_static(
                    "x-invalid-header",
                )))
            })?;
            let value = HeaderValue::from_bytes(header.value)?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}
