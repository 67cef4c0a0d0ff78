/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FtpTransferSetupError {
    #[error("data connection failed: {0}")]
    ConnectFailed(io::Error),
    #[error("timed out to open data connection")]
    ConnectTimedOut,
}

#[derive(Debug, Error)]
pub enum FtpLineDataReadError {
    #[error("read failed: {0}")]
    ReadFailed(#[from] io::Error),
    #[error("line {0} is too long")]
    LineTooLong(usize),
    #[error("too many lines")]
    TooManyLines,
    #[error("unsupported encoding")]
    UnsupportedEncoding,
    #[error("aborted by callback")]
    AbortedByCallback,
    #[error("timed out to read all lines")]
    TimedOut,
}
