/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;
use crate::io_ext::limited_read_until;

/// Consumer of the lines of a listing, without the line ending.
#[async_trait]
pub trait FtpLineDataReceiver {
    async fn recv_line(&mut self, line: &str);
    fn should_return_early(&self) -> bool;
}

pub(crate) struct FtpLineDataTransfer<T: AsyncRead> {
    io: BufReader<T>,
    max_lines: usize,
    max_line_len: usize,
    line_buf: Vec<u8>,
}

impl<T> FtpLineDataTransfer<T>
where
    T: AsyncRead + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig) -> Self {
        FtpLineDataTransfer {
            io: BufReader::new(io),
            max_lines: config.list_max_entries,
            max_line_len: config.list_max_line_len,
            line_buf: Vec::with_capacity(config.list_max_line_len),
        }
    }

    async fn send_buf_to_receiver<R>(
        &mut self,
        receiver: &mut R,
    ) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver,
    {
        let s = std::str::from_utf8(&self.line_buf)
            .map_err(|_| FtpLineDataReadError::UnsupportedEncoding)?;
        receiver.recv_line(s.trim_end_matches(['\r', '\n'])).await;
        if receiver.should_return_early() {
            return Err(FtpLineDataReadError::AbortedByCallback);
        }
        self.line_buf.clear();
        Ok(())
    }

    pub(crate) async fn read_to_end<R>(mut self, receiver: &mut R) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver,
    {
        for i in 0..self.max_lines {
            let (found, nr) = limited_read_until(
                &mut self.io,
                b'\n',
                self.max_line_len,
                &mut self.line_buf,
            )
            .await?;
            if nr == 0 {
                return Ok(());
            }

            if !found {
                if nr >= self.max_line_len {
                    return Err(FtpLineDataReadError::LineTooLong(i + 1));
                }
                // the last line has no line ending
                return self.send_buf_to_receiver(receiver).await;
            }

            self.send_buf_to_receiver(receiver).await?;
        }

        if self.io.fill_buf().await?.is_empty() {
            Ok(())
        } else {
            Err(FtpLineDataReadError::TooManyLines)
        }
    }
}
