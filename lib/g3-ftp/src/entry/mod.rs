/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, Utc};

use crate::error::FtpEntryParseError;

mod entry_type;
pub use entry_type::FtpEntryType;

pub(crate) mod time_val;

mod facts;
pub use facts::parse_facts_line;

mod dos;
mod unix;

/// One remote file system object, as found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpEntry {
    pub name: String,
    pub entry_type: FtpEntryType,
    pub size: u64,
    /// None if the server did not send a parsable time
    pub mtime: Option<DateTime<Utc>>,
    /// the link target, if known
    pub target: Option<String>,
}

impl FtpEntry {
    pub(crate) fn new(name: &str, entry_type: FtpEntryType) -> Self {
        FtpEntry {
            name: name.to_string(),
            entry_type,
            size: 0,
            mtime: None,
            target: None,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.entry_type == FtpEntryType::Folder
    }

    pub(crate) fn is_dot(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Parse one line of a LIST reply, in unix `ls -l` or DOS format.
pub fn parse_list_line(line: &str) -> Result<FtpEntry, FtpEntryParseError> {
    parse_list_line_at(line, Utc::now())
}

/// The same as [`parse_list_line`], with `now` used to infer missing years.
pub(crate) fn parse_list_line_at(
    line: &str,
    now: DateTime<Utc>,
) -> Result<FtpEntry, FtpEntryParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let fields = split_fields(line);
    let Some((_, first)) = fields.first() else {
        return Err(FtpEntryParseError::EmptyLine);
    };

    if first.as_bytes()[0].is_ascii_digit() {
        dos::parse_line(line, &fields)
    } else {
        unix::parse_line(line, &fields, now)
    }
}

/// Split the line at ascii whitespaces, keeping the start offset of each field.
fn split_fields(line: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::with_capacity(10);
    let mut start: Option<usize> = None;
    for (i, c) in line.char_indices() {
        if c.is_ascii_whitespace() {
            if let Some(s) = start.take() {
                fields.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        fields.push((s, &line[s..]));
    }
    fields
}
