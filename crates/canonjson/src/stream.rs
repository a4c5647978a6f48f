//! Streaming encoder.

use std::io::{self, Write};

use crate::encode;
use crate::errors::Error;
use crate::pool;
use crate::value::Value;

/// Writes canonical encodings of successive values to an output sink.
///
/// Each value is terminated with a single newline; some separator is
/// required anyway so a reader knows a bare number has no more digits
/// coming. The first sink error is sticky: every later call fails with
/// the same error without touching the sink again. An encoder is
/// single-owner state; sharing one across threads needs external
/// synchronization.
pub struct Encoder<W: Write> {
    writer: W,
    failed: Option<(io::ErrorKind, String)>,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: None,
        }
    }

    /// Serializes `value`, appends a newline, and hands the whole buffer
    /// to the sink in one write.
    pub fn encode(&mut self, value: &Value) -> Result<(), Error> {
        if let Some((kind, message)) = &self.failed {
            return Err(Error::Io(io::Error::new(*kind, message.clone())));
        }
        let mut buf = pool::acquire();
        if let Err(err) = encode::append_value(&mut buf, value) {
            pool::release(buf);
            return Err(err);
        }
        buf.push(b'\n');
        let written = self.writer.write_all(&buf);
        pool::release(buf);
        if let Err(err) = written {
            self.failed = Some((err.kind(), err.to_string()));
            return Err(Error::Io(err));
        }
        Ok(())
    }

    /// Consumes the encoder and returns the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_newline_terminated() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.encode(&Value::Int(1)).unwrap();
        encoder
            .encode(&Value::Array(vec![Value::Bool(true), Value::Null]))
            .unwrap();
        assert_eq!(encoder.into_inner(), b"1\n[true,null]\n");
    }

    #[test]
    fn encode_errors_leave_the_sink_untouched() {
        let mut encoder = Encoder::new(Vec::new());
        assert!(encoder.encode(&Value::Float(f64::NAN)).is_err());
        encoder.encode(&Value::Int(2)).unwrap();
        assert_eq!(encoder.into_inner(), b"2\n");
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn first_write_error_is_sticky() {
        let mut encoder = Encoder::new(FailingSink);
        let first = encoder.encode(&Value::Int(1));
        assert!(matches!(first, Err(Error::Io(_))));
        let second = encoder.encode(&Value::Int(2));
        match second {
            Err(Error::Io(err)) => {
                assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
                assert!(err.to_string().contains("sink closed"));
            }
            other => panic!("expected sticky I/O error, got {other:?}"),
        }
    }
}
