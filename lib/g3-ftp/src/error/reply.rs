/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use crate::control::FtpCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpReplyKind {
    NotFound,
    AlreadyExists,
    NotEmpty,
    PermissionDenied,
    AuthFailure,
    NotImplemented,
    ServiceNotAvailable,
    Transient,
    Other,
}

/// A reply that does not match the expected one for the command.
///
/// The displayed text is the server status line, code and message as
/// received, so callers may match on the server wording.
#[derive(Debug)]
pub struct FtpReplyError {
    cmd: FtpCommand,
    code: u16,
    message: String,
}

impl FtpReplyError {
    pub(crate) fn new(cmd: FtpCommand, code: u16, message: String) -> Self {
        FtpReplyError { cmd, code, message }
    }

    #[inline]
    pub fn command(&self) -> FtpCommand {
        self.cmd
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_transient(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent(&self) -> bool {
        (500..600).contains(&self.code)
    }

    pub fn kind(&self) -> FtpReplyKind {
        match self.code {
            421 => FtpReplyKind::ServiceNotAvailable,
            332 | 530 | 532 => FtpReplyKind::AuthFailure,
            202 | 502 | 504 => FtpReplyKind::NotImplemented,
            // 550 is "requested action not taken", the meaning depends on the command
            550 => match self.cmd {
                FtpCommand::MKD => FtpReplyKind::AlreadyExists,
                FtpCommand::RMD => FtpReplyKind::NotEmpty,
                _ => FtpReplyKind::NotFound,
            },
            553 => FtpReplyKind::PermissionDenied,
            400..=499 => FtpReplyKind::Transient,
            _ => FtpReplyKind::Other,
        }
    }
}

impl fmt::Display for FtpReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

impl std::error::Error for FtpReplyError {}
