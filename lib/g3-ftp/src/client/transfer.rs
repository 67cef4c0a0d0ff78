/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpClient;
use crate::connection::FtpConnectionProvider;
use crate::control::FtpCommand;
use crate::entry::{self, FtpEntry};
use crate::error::{
    FtpCommandError, FtpEntryParseError, FtpLineDataReadError, FtpTransferSetupError,
};
use crate::transfer::{FtpLineDataReceiver, FtpLineDataTransfer, FtpTransferStream};

type EntryParseFn = fn(&str) -> Result<FtpEntry, FtpEntryParseError>;

struct EntryReceiver {
    parse: EntryParseFn,
    entries: Vec<FtpEntry>,
}

#[async_trait]
impl FtpLineDataReceiver for EntryReceiver {
    async fn recv_line(&mut self, line: &str) {
        match (self.parse)(line) {
            Ok(entry) => {
                if !entry.is_dot() {
                    self.entries.push(entry);
                }
            }
            Err(FtpEntryParseError::EmptyLine | FtpEntryParseError::NotAnEntry) => {}
            Err(e) => debug!("skip listing line '{line}': {e}"),
        }
    }

    fn should_return_early(&self) -> bool {
        false
    }
}

#[derive(Default)]
struct NameReceiver {
    names: Vec<String>,
}

#[async_trait]
impl FtpLineDataReceiver for NameReceiver {
    async fn recv_line(&mut self, line: &str) {
        if !line.is_empty() {
            self.names.push(line.to_string());
        }
    }

    fn should_return_early(&self) -> bool {
        false
    }
}

impl<CP, S> FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn request_passive_port(&mut self) -> Result<(Option<IpAddr>, u16), FtpCommandError> {
        if !self.config.disable_epsv && !self.epsv_rejected {
            match self.control.request_epsv_port().await {
                Ok(port) => return Ok((None, port)),
                Err(e) if e.is_permanent_reply() && self.config.epsv_fallback_pasv => {
                    warn!("EPSV rejected by server, fall back to PASV: {e}");
                    self.epsv_rejected = true;
                }
                Err(e) => return Err(e),
            }
        }

        let addr = self.control.request_pasv_addr().await?;
        let ip = addr.ip();
        if ip.is_unspecified() {
            Ok((None, addr.port()))
        } else {
            Ok((Some(ip), addr.port()))
        }
    }

    async fn open_data_connection(&mut self) -> Result<S, FtpCommandError> {
        let (ip, port) = self.request_passive_port().await?;
        match tokio::time::timeout(
            self.config.connect_timeout,
            self.conn_provider.new_data_connection(ip, port),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(FtpTransferSetupError::ConnectFailed(e).into()),
            Err(_) => Err(FtpTransferSetupError::ConnectTimedOut.into()),
        }
    }

    /// The data connection must be ready before the transfer command is sent,
    /// as the server may start sending as soon as it gets the command.
    async fn open_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        offset: u64,
    ) -> Result<FtpTransferStream<'_, S>, FtpCommandError> {
        let data = self.open_data_connection().await?;
        if offset > 0 {
            self.control.request_restart(offset).await?;
        }
        self.control.start_transfer(cmd, path).await?;

        let end_wait_timeout = self.config.transfer.end_wait_timeout;
        Ok(FtpTransferStream::new(
            &mut self.control,
            data,
            end_wait_timeout,
        ))
    }

    /// Download the file at `path`.
    ///
    /// The returned stream should be closed after use.
    pub async fn retr(&mut self, path: &str) -> Result<FtpTransferStream<'_, S>, FtpCommandError> {
        self.open_transfer(FtpCommand::RETR, path, 0).await
    }

    /// Download the file at `path`, starting at byte `offset`.
    pub async fn retr_from(
        &mut self,
        path: &str,
        offset: u64,
    ) -> Result<FtpTransferStream<'_, S>, FtpCommandError> {
        self.open_transfer(FtpCommand::RETR, path, offset).await
    }

    async fn upload<R>(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        offset: u64,
        reader: &mut R,
    ) -> Result<u64, FtpCommandError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut stream = self.open_transfer(cmd, path, offset).await?;
        let copied = match tokio::io::copy(reader, &mut stream).await {
            Ok(n) => n,
            Err(e) => {
                if let Err(ce) = stream.close().await {
                    debug!("failed to close {cmd} transfer: {ce}");
                }
                return Err(FtpCommandError::TransferFailed(e));
            }
        };
        stream.finish().await?;
        Ok(copied)
    }

    /// Upload all data from `reader` to `path`, and return the bytes sent.
    pub async fn stor<R>(&mut self, path: &str, reader: &mut R) -> Result<u64, FtpCommandError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.upload(FtpCommand::STOR, path, 0, reader).await
    }

    /// Upload to `path` and let the server write from byte `offset`.
    pub async fn stor_from<R>(
        &mut self,
        path: &str,
        reader: &mut R,
        offset: u64,
    ) -> Result<u64, FtpCommandError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.upload(FtpCommand::STOR, path, offset, reader).await
    }

    pub async fn append<R>(&mut self, path: &str, reader: &mut R) -> Result<u64, FtpCommandError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.upload(FtpCommand::APPE, path, 0, reader).await
    }

    async fn read_lines<R>(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        receiver: &mut R,
    ) -> Result<(), FtpCommandError>
    where
        R: FtpLineDataReceiver,
    {
        let transfer_config = self.config.transfer.clone();
        let mut stream = self.open_transfer(cmd, path, 0).await?;

        let transfer = FtpLineDataTransfer::new(&mut stream, &transfer_config);
        match tokio::time::timeout(
            transfer_config.list_all_timeout,
            transfer.read_to_end(receiver),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(FtpLineDataReadError::TimedOut.into()),
        }

        stream.finish().await
    }

    /// List the directory at `path`. The current directory is used if
    /// `path` is empty.
    ///
    /// MLSD is used if the server supports it, otherwise LIST.
    pub async fn list(&mut self, path: &str) -> Result<Vec<FtpEntry>, FtpCommandError> {
        let (cmd, parse): (FtpCommand, EntryParseFn) =
            if self.server_feature.support_mlst() && !self.config.disable_mlsd {
                (FtpCommand::MLSD, entry::parse_facts_line)
            } else {
                (FtpCommand::LIST, entry::parse_list_line)
            };

        let mut receiver = EntryReceiver {
            parse,
            entries: Vec::new(),
        };
        self.read_lines(cmd, path, &mut receiver).await?;
        Ok(receiver.entries)
    }

    pub async fn name_list(&mut self, path: &str) -> Result<Vec<String>, FtpCommandError> {
        let mut receiver = NameReceiver::default();
        self.read_lines(FtpCommand::NLST, path, &mut receiver)
            .await?;
        Ok(receiver.names)
    }

    /// Send the raw LIST lines to `receiver`.
    pub async fn list_lines<R>(&mut self, path: &str, receiver: &mut R) -> Result<(), FtpCommandError>
    where
        R: FtpLineDataReceiver,
    {
        self.read_lines(FtpCommand::LIST, path, receiver).await
    }
}
