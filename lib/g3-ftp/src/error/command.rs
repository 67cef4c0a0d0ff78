/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::{FtpLineDataReadError, FtpRawResponseError, FtpReplyError, FtpTransferSetupError};
use crate::control::FtpCommand;

#[derive(Debug, Error)]
pub enum FtpCommandError {
    #[error("session already closed")]
    SessionClosed,
    #[error("unable to send command: {0}")]
    SendFailed(io::Error),
    #[error("line break found in the parameter of command {0}")]
    InvalidParameter(FtpCommand),
    #[error("unable to recv reply: {0}")]
    RecvFailed(#[from] FtpRawResponseError),
    #[error(transparent)]
    ServerReply(#[from] FtpReplyError),
    #[error("invalid reply {1} syntax to command {0}")]
    InvalidReplySyntax(FtpCommand, u16),
    #[error(transparent)]
    TransferSetupFailed(#[from] FtpTransferSetupError),
    #[error("data transfer failed: {0}")]
    TransferFailed(io::Error),
    #[error("list data read failed: {0}")]
    ListReadFailed(#[from] FtpLineDataReadError),
}

impl FtpCommandError {
    pub fn reply(&self) -> Option<&FtpReplyError> {
        match self {
            FtpCommandError::ServerReply(e) => Some(e),
            _ => None,
        }
    }

    pub fn reply_code(&self) -> Option<u16> {
        self.reply().map(|e| e.code())
    }

    pub(crate) fn is_permanent_reply(&self) -> bool {
        self.reply().map(|e| e.is_permanent()).unwrap_or(false)
    }
}
