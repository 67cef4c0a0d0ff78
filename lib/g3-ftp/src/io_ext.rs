/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Read until `delimiter` (included) or until `max_len` bytes have been
/// appended to `buf`.
///
/// Returns whether the delimiter was found and how many bytes were read.
/// A zero length means EOF.
pub(crate) async fn limited_read_until<R>(
    reader: &mut R,
    delimiter: u8,
    max_len: usize,
    buf: &mut Vec<u8>,
) -> io::Result<(bool, usize)>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok((false, total));
        }

        let left = max_len.saturating_sub(total);
        let window = &available[..available.len().min(left)];
        match memchr::memchr(delimiter, window) {
            Some(i) => {
                buf.extend_from_slice(&window[..=i]);
                reader.consume(i + 1);
                return Ok((true, total + i + 1));
            }
            None => {
                let n = window.len();
                buf.extend_from_slice(window);
                reader.consume(n);
                total += n;
                if total >= max_len {
                    return Ok((false, total));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn read_split_line() {
        let stream = Builder::new().read(b"220 ser").read(b"vice ready\r\n").build();
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let (found, len) = limited_read_until(&mut reader, b'\n', 64, &mut buf).await.unwrap();
        assert!(found);
        assert_eq!(len, 19);
        assert_eq!(buf, b"220 service ready\r\n");
    }

    #[tokio::test]
    async fn read_too_long() {
        let stream = Builder::new().read(b"0123456789\n").build();
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let (found, len) = limited_read_until(&mut reader, b'\n', 4, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(len, 4);
        assert_eq!(buf, b"0123");
    }

    #[tokio::test]
    async fn read_eof() {
        let stream = Builder::new().read(b"abc").build();
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let (found, len) = limited_read_until(&mut reader, b'\n', 64, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(len, 3);

        buf.clear();
        let (found, len) = limited_read_until(&mut reader, b'\n', 64, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(len, 0);
    }
}
