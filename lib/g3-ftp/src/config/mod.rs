/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[cfg(feature = "yaml")]
mod yaml;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtpControlConfig {
    pub max_line_len: usize,
    pub max_multi_lines: usize,
    pub command_timeout: Duration,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: 2048,
            max_multi_lines: 128,
            command_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtpTransferConfig {
    pub list_max_line_len: usize,
    pub list_max_entries: usize,
    pub list_all_timeout: Duration,
    /// how long `close()` waits for the end reply of a transfer
    pub end_wait_timeout: Duration,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            list_max_line_len: 2048,
            list_max_entries: 65536,
            list_all_timeout: Duration::from_secs(120),
            end_wait_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtpClientConfig {
    pub control: FtpControlConfig,
    pub transfer: FtpTransferConfig,
    pub connect_timeout: Duration,
    pub greeting_timeout: Duration,
    /// use PASV only
    pub disable_epsv: bool,
    /// retry with PASV once the server rejects EPSV
    pub epsv_fallback_pasv: bool,
    /// use LIST even if the server supports MLSD
    pub disable_mlsd: bool,
    pub disable_utf8: bool,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: FtpControlConfig::default(),
            transfer: FtpTransferConfig::default(),
            connect_timeout: Duration::from_secs(30),
            greeting_timeout: Duration::from_secs(10),
            disable_epsv: false,
            epsv_fallback_pasv: true,
            disable_mlsd: false,
            disable_utf8: false,
        }
    }
}

impl FtpClientConfig {
    /// Set the dial timeout and the default timeout of control commands.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
        self.control.command_timeout = timeout;
    }
}
