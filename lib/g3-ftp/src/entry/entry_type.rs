/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FtpEntryType {
    File,
    Folder,
    Link,
}

impl fmt::Display for FtpEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FtpEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpEntryType::File => "file",
            FtpEntryType::Folder => "folder",
            FtpEntryType::Link => "link",
        }
    }

    /// Get the type from the mode string of an `ls -l` line.
    pub(super) fn from_unix_mode(mode: &str) -> Option<Self> {
        match mode.as_bytes().first()? {
            b'd' => Some(FtpEntryType::Folder),
            b'l' => Some(FtpEntryType::Link),
            b'-' | b'b' | b'c' | b'p' | b's' => Some(FtpEntryType::File),
            _ => None,
        }
    }
}
