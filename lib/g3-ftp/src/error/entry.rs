/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FtpEntryParseError {
    #[error("empty line")]
    EmptyLine,
    #[error("not a file entry")]
    NotAnEntry,
    #[error("unsupported line format")]
    UnsupportedFormat,
    #[error("no space delimiter")]
    NoSpaceDelimiter,
    #[error("no delimiter in fact ({0})")]
    NoDelimiterInFact(String),
    #[error("invalid size")]
    InvalidSize,
    #[error("empty entry name")]
    EmptyName,
}
