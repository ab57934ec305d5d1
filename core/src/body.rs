//! Request and response body streams with in-memory replay.
//!
//! # Design
//! A `Body` starts out either empty, buffered, or as a one-shot stream. The
//! first interception drains and closes the stream and swaps in a buffered
//! copy. A buffered body rewinds on every interception, so any number of
//! consumers (matchers, assertions, the JSON decoder) see the same bytes
//! without a second network read.

use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;

use crate::error::{Error, Result};

/// A readable stream with an explicit, fallible close.
pub trait ReadClose: Read + Send {
    fn close(&mut self) -> io::Result<()>;
}

/// Adapter for plain readers: closing is a no-op.
struct NopClose<R>(R);

impl<R: Read> Read for NopClose<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Send> ReadClose for NopClose<R> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Inner {
    Empty,
    Buffered { bytes: Bytes, pos: usize },
    Stream(Box<dyn ReadClose>),
}

pub struct Body {
    inner: Inner,
}

impl Body {
    pub fn empty() -> Self {
        Self { inner: Inner::Empty }
    }

    /// Wraps a reader whose close cannot fail.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::from_stream(NopClose(reader))
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: ReadClose + 'static,
    {
        Self {
            inner: Inner::Stream(Box::new(stream)),
        }
    }

    /// True once the content lives in memory and can be read again.
    pub fn is_replayable(&self) -> bool {
        !matches!(self.inner, Inner::Stream(_))
    }

    pub fn is_empty(&self) -> bool {
        match &self.inner {
            Inner::Empty => true,
            Inner::Buffered { bytes, .. } => bytes.is_empty(),
            Inner::Stream(_) => false,
        }
    }

    /// Reads the body to completion, closes the original stream and leaves a
    /// rewound in-memory copy in its place. Returns the full content.
    ///
    /// Calling this again returns the same bytes regardless of how much of
    /// the replayed copy was read in between.
    pub fn intercept(&mut self) -> Result<Bytes> {
        match &mut self.inner {
            Inner::Empty => Ok(Bytes::new()),
            Inner::Buffered { bytes, pos } => {
                *pos = 0;
                Ok(bytes.clone())
            }
            Inner::Stream(stream) => {
                let mut buf = Vec::new();
                let read = stream.read_to_end(&mut buf);
                // The stream is released even when reading failed part way.
                let closed = stream.close();
                if read.is_err() || closed.is_err() {
                    // A closed stream is never read again.
                    self.inner = Inner::Empty;
                }
                read.map_err(Error::BodyRead)?;
                closed.map_err(Error::BodyClose)?;

                let bytes = Bytes::from(buf);
                self.inner = Inner::Buffered {
                    bytes: bytes.clone(),
                    pos: 0,
                };
                Ok(bytes)
            }
        }
    }

    /// Closes an unread stream. Buffered and empty bodies have nothing to release.
    pub fn close(&mut self) -> Result<()> {
        if let Inner::Stream(stream) = &mut self.inner {
            let closed = stream.close();
            self.inner = Inner::Empty;
            closed.map_err(Error::BodyClose)?;
        }
        Ok(())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Empty => Ok(0),
            Inner::Buffered { bytes, pos } => {
                let remaining = &bytes[*pos..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n)
            }
            Inner::Stream(stream) => stream.read(buf),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Empty => f.write_str("Body::Empty"),
            Inner::Buffered { bytes, pos } => f
                .debug_struct("Body::Buffered")
                .field("len", &bytes.len())
                .field("pos", pos)
                .finish(),
            Inner::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Buffered { bytes, pos: 0 },
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(s: &'static [u8]) -> Self {
        Bytes::from_static(s).into()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;

    struct Tracked {
        data: io::Cursor<Vec<u8>>,
        closes: Arc<AtomicUsize>,
        fail_read: bool,
        fail_close: bool,
    }

    impl Tracked {
        fn new(data: &[u8]) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            let tracked = Self {
                data: io::Cursor::new(data.to_vec()),
                closes: Arc::clone(&closes),
                fail_read: false,
                fail_close: false,
            };
            (tracked, closes)
        }
    }

    impl Read for Tracked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_read {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.data.read(buf)
        }
    }

    impl ReadClose for Tracked {
        fn close(&mut self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(io::Error::other("close failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn intercept_closes_stream_once_and_buffers() {
        let (stream, closes) = Tracked::new(b"hello");
        let mut body = Body::from_stream(stream);
        assert!(!body.is_replayable());

        assert_eq!(body.intercept().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(body.intercept().unwrap(), Bytes::from_static(b"hello"));
        assert!(body.is_replayable());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn intercept_rewinds_after_partial_read() {
        let mut body = Body::from("abcdef");
        let mut buf = [0u8; 3];
        body.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");

        assert_eq!(body.intercept().unwrap(), Bytes::from_static(b"abcdef"));
        let mut rest = String::new();
        body.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "abcdef");
    }

    #[test]
    fn read_failure_is_reported_and_stream_closed() {
        let (mut stream, closes) = Tracked::new(b"data");
        stream.fail_read = true;
        let mut body = Body::from_stream(stream);

        let err = body.intercept().unwrap_err();
        assert!(matches!(err, Error::BodyRead(_)));
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // The closed stream is gone; later calls see an empty body.
        assert!(body.is_replayable());
        assert!(body.intercept().unwrap().is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_failure_is_reported() {
        let (mut stream, _) = Tracked::new(b"data");
        stream.fail_close = true;
        let mut body = Body::from_stream(stream);

        let err = body.intercept().unwrap_err();
        assert!(matches!(err, Error::BodyClose(_)));
        assert_eq!(err.component(), "body");
        assert!(body.intercept().unwrap().is_empty());
    }

    #[test]
    fn empty_body_intercepts_to_nothing() {
        let mut body = Body::empty();
        assert!(body.intercept().unwrap().is_empty());
        assert!(body.is_empty());
        body.close().unwrap();
    }

    proptest! {
        #[test]
        fn intercepting_twice_yields_identical_bytes(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let mut body = Body::from_reader(io::Cursor::new(data.clone()));
            let first = body.intercept().unwrap();
            let second = body.intercept().unwrap();
            prop_assert_eq!(&first[..], &data[..]);
            prop_assert_eq!(&first, &second);

            let mut replay = Vec::new();
            body.read_to_end(&mut replay).unwrap();
            prop_assert_eq!(replay, data);
        }
    }
}
