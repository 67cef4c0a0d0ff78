/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::{FtpEntry, FtpEntryType};
use crate::error::FtpEntryParseError;

// 12-01-21  10:20AM       <DIR>          incoming
// 12-01-21  10:20AM                   14 magic-file
pub(super) fn parse_line(
    line: &str,
    fields: &[(usize, &str)],
) -> Result<FtpEntry, FtpEntryParseError> {
    if fields.len() < 3 || !is_date_field(fields[0].1) {
        return Err(FtpEntryParseError::UnsupportedFormat);
    }
    let Some((name_offset, _)) = fields.get(3) else {
        return Err(FtpEntryParseError::EmptyName);
    };
    let name = &line[*name_offset..];

    let mut entry = if fields[2].1.eq_ignore_ascii_case("<DIR>") {
        FtpEntry::new(name, FtpEntryType::Folder)
    } else {
        let mut entry = FtpEntry::new(name, FtpEntryType::File);
        entry.size = u64::from_str(fields[2].1).map_err(|_| FtpEntryParseError::InvalidSize)?;
        entry
    };
    entry.mtime = parse_time(fields[0].1, fields[1].1);
    Ok(entry)
}

fn is_date_field(s: &str) -> bool {
    let b = s.as_bytes();
    (b.len() == 8 || b.len() == 10)
        && b[2] == b'-'
        && b[5] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 2 || i == 5 || c.is_ascii_digit())
}

fn parse_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = if date.len() == 8 {
        NaiveDate::parse_from_str(date, "%m-%d-%y").ok()?
    } else {
        NaiveDate::parse_from_str(date, "%m-%d-%Y").ok()?
    };
    let time = NaiveTime::parse_from_str(time, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()?;
    Some(date.and_time(time).and_utc())
}
