/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::time::{Instant, Sleep};

use crate::control::FtpControlChannel;
use crate::error::FtpCommandError;

fn timed_out_error() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "data connection i/o timeout")
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "data connection already closed")
}

/// A data connection opened for one transfer command.
///
/// The control channel is borrowed until the stream is dropped, so no other
/// command can be sent while the transfer is in progress. If the stream is
/// dropped without [`close`](Self::close), the end reply is read by the next
/// command.
pub struct FtpTransferStream<'a, S>
where
    S: AsyncRead + AsyncWrite,
{
    control: &'a mut FtpControlChannel<S>,
    data: Option<S>,
    deadline: Option<Pin<Box<Sleep>>>,
    end_wait_timeout: Duration,
    closed: bool,
}

impl<'a, S> FtpTransferStream<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(
        control: &'a mut FtpControlChannel<S>,
        data: S,
        end_wait_timeout: Duration,
    ) -> Self {
        FtpTransferStream {
            control,
            data: Some(data),
            deadline: None,
            end_wait_timeout,
            closed: false,
        }
    }

    /// Set the deadline of all following reads and writes on the data connection.
    pub fn set_deadline(&mut self, deadline: Instant) {
        match &mut self.deadline {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.deadline = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
    }

    pub fn clear_deadline(&mut self) {
        self.deadline = None;
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close_data(&mut self) -> io::Result<()> {
        let Some(mut data) = self.data.take() else {
            return Ok(());
        };
        match data.shutdown().await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Close the data connection and read the end reply.
    ///
    /// The end reply is waited for at most `end_wait_timeout` and is not
    /// checked, only the data connection close error is returned. Only the
    /// first call does any I/O.
    pub async fn close(&mut self) -> Result<(), FtpCommandError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let r = self.close_data().await;
        if let Err(e) = self
            .control
            .wait_transfer_end(self.end_wait_timeout, false)
            .await
        {
            debug!("ignored transfer end reply: {e}");
        }
        r.map_err(FtpCommandError::TransferFailed)
    }

    /// Close the data connection and require a positive end reply.
    pub(crate) async fn finish(mut self) -> Result<(), FtpCommandError> {
        self.closed = true;
        self.close_data()
            .await
            .map_err(FtpCommandError::TransferFailed)?;
        let timeout = self.control.command_timeout();
        self.control.wait_transfer_end(timeout, true).await
    }

    fn poll_deadline(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match &mut self.deadline {
            Some(sleep) => sleep.as_mut().poll(cx),
            None => Poll::Pending,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .as_ref()
            .map(|sleep| sleep.deadline() <= Instant::now())
            .unwrap_or(false)
    }

    fn poll_data_io<F, T>(&mut self, cx: &mut Context<'_>, f: F) -> Poll<io::Result<T>>
    where
        F: FnOnce(Pin<&mut S>, &mut Context<'_>) -> Poll<io::Result<T>>,
    {
        if self.deadline_passed() {
            return Poll::Ready(Err(timed_out_error()));
        }
        let Some(data) = self.data.as_mut() else {
            return Poll::Ready(Err(closed_error()));
        };
        match f(Pin::new(data), cx) {
            Poll::Ready(r) => Poll::Ready(r),
            Poll::Pending => {
                if self.poll_deadline(cx).is_ready() {
                    Poll::Ready(Err(timed_out_error()))
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

impl<S> AsyncRead for FtpTransferStream<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.get_mut()
            .poll_data_io(cx, |data, cx| data.poll_read(cx, buf))
    }
}

impl<S> AsyncWrite for FtpTransferStream<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut()
            .poll_data_io(cx, |data, cx| data.poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().poll_data_io(cx, |data, cx| data.poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut()
            .poll_data_io(cx, |data, cx| data.poll_shutdown(cx))
    }
}
