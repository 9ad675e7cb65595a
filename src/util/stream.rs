use std::io::{self, Read};

use aws_sdk_s3::primitives::ByteStream;
use bytes::{Buf, Bytes};
use tokio::runtime::Handle;

use crate::util::poll;

/// Blocking reader over an SDK response body. Holds at most one body chunk
/// in memory at a time.
pub struct ByteStreamReader<'a> {
    handle: &'a Handle,
    body: ByteStream,
    chunk: Bytes,
}

impl<'a> ByteStreamReader<'a> {
    pub fn new(handle: &'a Handle, body: ByteStream) -> Self {
        Self {
            handle,
            body,
            chunk: Bytes::new(),
        }
    }
}

impl Read for ByteStreamReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while !self.chunk.has_remaining() {
            match poll::poll_until_ready(self.handle, self.body.try_next()) {
                Ok(Some(next)) => self.chunk = next,
                Ok(None) => return Ok(0),
                Err(err) => return Err(io::Error::other(err)),
            }
        }

        let len = buf.len().min(self.chunk.remaining());
        self.chunk.copy_to_slice(&mut buf[..len]);

        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_read_to_end() {
        let rt = runtime();

        let cases = vec![
            b"".to_vec(),
            b"hello".to_vec(),
            vec![7u8; 64 * 1024 + 3],
        ];

        for expected in cases {
            let mut reader = ByteStreamReader::new(rt.handle(), ByteStream::from(expected.clone()));
            let mut out = Vec::new();
            reader.read_to_end(&mut out).unwrap();
            assert_eq!(out, expected, "failed for case of len: {}", expected.len());
        }
    }

    #[test]
    fn test_read_small_buffer() {
        let rt = runtime();
        let mut reader =
            ByteStreamReader::new(rt.handle(), ByteStream::from(b"abcdefg".to_vec()));

        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"def");
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(&buf[..1], b"g");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
