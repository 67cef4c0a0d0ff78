/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod client;
mod config;
mod connection;
mod control;
mod debug;
mod entry;
mod error;
mod feature;
mod io_ext;
mod transfer;
mod walker;

pub use client::{FtpClient, TcpFtpClient};
pub use config::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};
pub use connection::{FtpConnectionProvider, TcpConnectionProvider};
pub use control::FtpCommand;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};
pub use entry::{FtpEntry, FtpEntryType, parse_facts_line, parse_list_line};
pub use error::{
    FtpCommandError, FtpConnectError, FtpEntryParseError, FtpLineDataReadError,
    FtpRawResponseError, FtpReplyError, FtpReplyKind, FtpTransferSetupError,
};
pub use feature::FtpServerFeature;
pub use transfer::{FtpLineDataReceiver, FtpTransferStream, FtpTransferType};
pub use walker::FtpWalker;
