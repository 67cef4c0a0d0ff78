/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::FtpControlChannel;
use crate::error::FtpCommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpCommand(&'static str);

impl FtpCommand {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! ftp_commands {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $phrase:expr);
        )+
    ) => {
        impl FtpCommand {
        $(
            $(#[$docs])*
            pub const $konst: FtpCommand = FtpCommand($phrase);
        )+
        }
    };
}

ftp_commands! {
    /// a fake command for greeting
    (GREETING, "-");
    (FEAT, "FEAT");
    (OPTS_UTF8_ON, "OPTS UTF8 ON");
    (USER, "USER");
    (PASS, "PASS");
    (QUIT, "QUIT");
    (REIN, "REIN");
    (NOOP, "NOOP");
    (CWD, "CWD");
    (CDUP, "CDUP");
    (PWD, "PWD");
    (TYPE_A, "TYPE A");
    (TYPE_I, "TYPE I");
    (PASV, "PASV");
    (EPSV, "EPSV");
    (LIST, "LIST");
    (MLSD, "MLSD");
    (MLST, "MLST");
    (NLST, "NLST");
    (REST, "REST");
    (RETR, "RETR");
    (STOR, "STOR");
    (APPE, "APPE");
    (RNFR, "RNFR");
    (RNTO, "RNTO");
    (DELE, "DELE");
    (MKD, "MKD");
    (RMD, "RMD");
    (SIZE, "SIZE");
    (MDTM, "MDTM");
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn send_all(&mut self, buf: &[u8]) -> Result<(), FtpCommandError> {
        if self.closed {
            return Err(FtpCommandError::SessionClosed);
        }
        self.drain_transfer_end().await?;

        self.stream
            .write_all(buf)
            .await
            .map_err(FtpCommandError::SendFailed)?;
        self.stream
            .flush()
            .await
            .map_err(FtpCommandError::SendFailed)?;
        Ok(())
    }

    pub(super) async fn send_cmd(&mut self, cmd: FtpCommand) -> Result<(), FtpCommandError> {
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(cmd, None);

        let len = cmd.0.len() + 2;
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(cmd.0.as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }

    pub(super) async fn send_cmd1(
        &mut self,
        cmd: FtpCommand,
        param1: &str,
    ) -> Result<(), FtpCommandError> {
        if memchr::memchr2(b'\r', b'\n', param1.as_bytes()).is_some() {
            return Err(FtpCommandError::InvalidParameter(cmd));
        }

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(cmd, Some(param1));

        let len = cmd.0.len() + 1 + param1.len() + 2;
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(cmd.0.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(param1.as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }

    /// Send the command with the parameter only if it is not empty.
    pub(super) async fn send_cmd_opt(
        &mut self,
        cmd: FtpCommand,
        param1: &str,
    ) -> Result<(), FtpCommandError> {
        if param1.is_empty() {
            self.send_cmd(cmd).await
        } else {
            self.send_cmd1(cmd, param1).await
        }
    }
}
