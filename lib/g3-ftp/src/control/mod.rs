/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};

use crate::FtpControlConfig;
use crate::entry::{self, FtpEntry, time_val};
use crate::error::{FtpCommandError, FtpRawResponseError};
use crate::feature::FtpServerFeature;
use crate::transfer::FtpTransferType;

mod response;

mod command;
pub use command::FtpCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FtpAuthStatus {
    LoggedIn,
    NeedPassword,
}

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    config: FtpControlConfig,
    stream: BufStream<T>,
    /// the transfer command whose end reply has not been read yet
    pending_end_reply: Option<FtpCommand>,
    closed: bool,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        FtpControlChannel {
            config,
            stream: BufStream::new(stream),
            pending_end_reply: None,
            closed: false,
        }
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub(crate) fn command_timeout(&self) -> Duration {
        self.config.command_timeout
    }

    #[cfg(test)]
    pub(crate) fn has_pending_transfer(&self) -> bool {
        self.pending_end_reply.is_some()
    }

    /// Read the end reply left by a previous transfer, if any.
    async fn drain_transfer_end(&mut self) -> Result<(), FtpCommandError> {
        let Some(cmd) = self.pending_end_reply.take() else {
            return Ok(());
        };

        match self.timed_read_raw_response("drain transfer end").await {
            Ok(reply) => {
                debug!("drained {} end reply for {cmd}", reply.code());
                Ok(())
            }
            Err(e) => {
                // replies can not be matched to commands any more
                self.closed = true;
                Err(e.into())
            }
        }
    }

    /// Wait for the end reply of the current transfer.
    ///
    /// In non strict mode, a timeout keeps the reply pending for the next
    /// command and a closed connection is not treated as an error.
    pub(crate) async fn wait_transfer_end(
        &mut self,
        timeout: Duration,
        strict: bool,
    ) -> Result<(), FtpCommandError> {
        let Some(cmd) = self.pending_end_reply else {
            return Ok(());
        };

        let reply = match tokio::time::timeout(timeout, self.read_raw_response()).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(FtpRawResponseError::ConnectionClosed)) if !strict => {
                self.pending_end_reply = None;
                self.closed = true;
                return Ok(());
            }
            Ok(Err(e)) => {
                self.pending_end_reply = None;
                if e.is_fatal() {
                    self.closed = true;
                }
                return Err(e.into());
            }
            Err(_) => {
                return if strict {
                    Err(FtpRawResponseError::ReadResponseTimedOut("wait transfer end").into())
                } else {
                    debug!("no end reply for {cmd} yet, will drain it later");
                    Ok(())
                };
            }
        };

        self.pending_end_reply = None;
        match reply.code() {
            226 | 250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_raw_response().await?;
            return match reply.code() {
                120 => continue,
                220 => Ok(()),
                _ => Err(reply.into_error(FtpCommand::GREETING).into()),
            };
        }
    }

    pub(crate) async fn check_server_feature(
        &mut self,
    ) -> Result<FtpServerFeature, FtpCommandError> {
        let mut feature = FtpServerFeature::default();

        let cmd = FtpCommand::FEAT;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("check server feature").await?;
        match reply.code() {
            500 | 501 | 502 => {}
            211 => {
                if let Some(lines) = reply.lines() {
                    for line in &lines[1..] {
                        if !line.starts_with(' ') {
                            break;
                        }
                        feature.parse_and_set(line.trim());
                    }
                }
            }
            _ => return Err(reply.into_error(cmd).into()),
        }

        Ok(feature)
    }

    pub(crate) async fn set_use_utf8(&mut self) -> Result<bool, FtpCommandError> {
        let cmd = FtpCommand::OPTS_UTF8_ON;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("set use utf8").await?;
        match reply.code() {
            500 | 501 | 502 => Ok(false),
            200 => Ok(true),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        name: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        self.send_cmd1(cmd, name).await?;

        let reply = self.timed_read_raw_response("send username").await?;
        match reply.code() {
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn send_password(&mut self, pass: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::PASS;
        self.send_cmd1(cmd, pass).await?;

        let reply = self.timed_read_raw_response("send password").await?;
        match reply.code() {
            202 | 230 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    /// Send QUIT and close the connection.
    ///
    /// The server may close the connection before replying.
    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        let r = match self.send_cmd(cmd).await {
            Ok(_) => match self.timed_read_raw_response("send quit").await {
                Ok(reply) => match reply.code() {
                    221 => Ok(()),
                    _ => Err(reply.into_error(cmd).into()),
                },
                Err(FtpRawResponseError::ConnectionClosed) => Ok(()),
                Err(e) => Err(e.into()),
            },
            Err(FtpCommandError::SendFailed(e)) => {
                debug!("connection already gone when sending {cmd}: {e}");
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.shutdown().await;
        r
    }

    async fn shutdown(&mut self) {
        self.closed = true;
        self.pending_end_reply = None;
        if let Err(e) = self.stream.shutdown().await {
            debug!("failed to shutdown control connection: {e}");
        }
    }

    pub(crate) async fn send_rein(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REIN;
        self.send_cmd(cmd).await?;

        loop {
            let reply = self.timed_read_raw_response("send rein").await?;
            return match reply.code() {
                120 => continue,
                220 => Ok(()),
                _ => Err(reply.into_error(cmd).into()),
            };
        }
    }

    pub(crate) async fn noop(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::NOOP;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("noop").await?;
        match reply.code() {
            200 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn change_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::CWD;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("change dir").await?;
        match reply.code() {
            200 | 250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn change_dir_to_parent(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::CDUP;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("change dir to parent").await?;
        match reply.code() {
            200 | 250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn current_dir(&mut self) -> Result<String, FtpCommandError> {
        let cmd = FtpCommand::PWD;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("current dir").await?;
        match reply.code() {
            257 => reply
                .parse_pwd_257_reply()
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 257)),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpCommand::TYPE_A,
            FtpTransferType::Image => FtpCommand::TYPE_I,
        };
        self.send_cmd(cmd).await?;

        let reply = self
            .timed_read_raw_response("request transfer type")
            .await?;
        match reply.code() {
            200 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_epsv_port(&mut self) -> Result<u16, FtpCommandError> {
        let cmd = FtpCommand::EPSV;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("request epsv port").await?;
        match reply.code() {
            229 => reply
                .parse_epsv_229_reply()
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 229)),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_pasv_addr(&mut self) -> Result<SocketAddr, FtpCommandError> {
        let cmd = FtpCommand::PASV;
        self.send_cmd(cmd).await?;

        let reply = self.timed_read_raw_response("request pasv addr").await?;
        match reply.code() {
            227 => reply
                .parse_pasv_227_reply()
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 227)),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_restart(&mut self, position: u64) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REST;
        self.send_cmd1(cmd, &position.to_string()).await?;

        let reply = self.timed_read_raw_response("request restart").await?;
        match reply.code() {
            350 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    /// Send a transfer command after the data connection has been opened.
    ///
    /// The end reply is left pending on success.
    pub(crate) async fn start_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<(), FtpCommandError> {
        self.send_cmd_opt(cmd, path).await?;

        let reply = self.timed_read_raw_response("start transfer").await?;
        match reply.code() {
            125 | 150 => {
                self.pending_end_reply = Some(cmd);
                Ok(())
            }
            // the transfer completed before we see the preliminary reply
            226 | 250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn rename_from(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::RNFR;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("rename from").await?;
        match reply.code() {
            350 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn rename_to(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::RNTO;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("rename to").await?;
        match reply.code() {
            250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn delete_file(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::DELE;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("delete file").await?;
        match reply.code() {
            250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn make_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::MKD;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("make dir").await?;
        match reply.code() {
            250 | 257 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn remove_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::RMD;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("remove dir").await?;
        match reply.code() {
            250 => Ok(()),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_size(&mut self, path: &str) -> Result<u64, FtpCommandError> {
        let cmd = FtpCommand::SIZE;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("request size").await?;
        match reply.code() {
            213 => reply
                .line_trimmed()
                .and_then(|s| u64::from_str(s).ok())
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 213)),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_mtime(
        &mut self,
        path: &str,
    ) -> Result<DateTime<Utc>, FtpCommandError> {
        let cmd = FtpCommand::MDTM;
        self.send_cmd1(cmd, path).await?;

        let reply = self.timed_read_raw_response("request mtime").await?;
        match reply.code() {
            213 => reply
                .line_trimmed()
                .and_then(|s| time_val::parse_from_str(s).ok())
                .ok_or(FtpCommandError::InvalidReplySyntax(cmd, 213)),
            _ => Err(reply.into_error(cmd).into()),
        }
    }

    pub(crate) async fn request_mlst(&mut self, path: &str) -> Result<FtpEntry, FtpCommandError> {
        let cmd = FtpCommand::MLST;
        self.send_cmd_opt(cmd, path).await?;

        let reply = self.timed_read_raw_response("request mlst").await?;
        match reply.code() {
            250 => {
                if let Some(lines) = reply.lines() {
                    if lines.len() >= 3 {
                        if let Ok(entry) = entry::parse_facts_line(lines[1].trim_start()) {
                            return Ok(entry);
                        }
                    }
                }
                Err(FtpCommandError::InvalidReplySyntax(cmd, 250))
            }
            _ => Err(reply.into_error(cmd).into()),
        }
    }
}
