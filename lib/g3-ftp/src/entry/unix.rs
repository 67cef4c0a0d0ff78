/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::{FtpEntry, FtpEntryType, time_val};
use crate::error::FtpEntryParseError;

// drwxr-xr-x   2 owner group  4096 Dec 01 10:20 name
// -rw-r--r--   1 owner  14 Dec 01  2021 name
pub(super) fn parse_line(
    line: &str,
    fields: &[(usize, &str)],
    now: DateTime<Utc>,
) -> Result<FtpEntry, FtpEntryParseError> {
    let mode = fields[0].1;
    if mode == "total" && fields.len() == 2 {
        return Err(FtpEntryParseError::NotAnEntry);
    }
    if mode.len() < 10 {
        return Err(FtpEntryParseError::UnsupportedFormat);
    }
    let entry_type =
        FtpEntryType::from_unix_mode(mode).ok_or(FtpEntryParseError::UnsupportedFormat)?;

    let month_at = locate_month(fields).ok_or(FtpEntryParseError::UnsupportedFormat)?;
    let Some((name_offset, _)) = fields.get(month_at + 3) else {
        return Err(FtpEntryParseError::EmptyName);
    };

    let size = u64::from_str(fields[month_at - 1].1).map_err(|_| FtpEntryParseError::InvalidSize)?;
    let mtime = parse_time(
        fields[month_at].1,
        fields[month_at + 1].1,
        fields[month_at + 2].1,
        now,
    );

    let name = &line[*name_offset..];
    let mut entry = match name.split_once(" -> ") {
        Some((name, target)) if entry_type == FtpEntryType::Link => {
            let mut entry = FtpEntry::new(name, entry_type);
            entry.target = Some(target.to_string());
            entry
        }
        _ => FtpEntry::new(name, entry_type),
    };
    entry.size = size;
    entry.mtime = mtime;
    Ok(entry)
}

/// Find the index of the month field, which follows the size field.
///
/// The group column, and even the link count, are optional. If no month name
/// can be found, the field count decides.
fn locate_month(fields: &[(usize, &str)]) -> Option<usize> {
    if fields.len() < 7 {
        return None;
    }

    for i in 3..=fields.len() - 3 {
        if time_val::month_from_abbr(fields[i].1).is_some()
            && is_all_digits(fields[i - 1].1)
            && looks_like_day_and_time(fields[i + 1].1, fields[i + 2].1)
        {
            return Some(i);
        }
    }

    if fields.len() >= 9 {
        Some(5)
    } else if fields.len() == 8 {
        Some(4)
    } else {
        None
    }
}

fn is_all_digits(s: &str) -> bool {
    s.bytes().all(|c| c.is_ascii_digit())
}

fn looks_like_day_and_time(day: &str, time_or_year: &str) -> bool {
    if day.len() > 2 || !is_all_digits(day) {
        return false;
    }
    match time_or_year.split_once(':') {
        Some((h, m)) => is_all_digits(h) && is_all_digits(m),
        None => is_all_digits(time_or_year),
    }
}

fn parse_time(
    month: &str,
    day: &str,
    time_or_year: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let month = time_val::month_from_abbr(month)?;
    let day = u32::from_str(day).ok()?;

    if let Some((hour, minute)) = time_or_year.split_once(':') {
        let hour = u32::from_str(hour).ok()?;
        let minute = u32::from_str(minute).ok()?;
        let at_year = |year: i32| -> Option<DateTime<Utc>> {
            let dt = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
            Some(dt.and_utc())
        };
        // recent files have no year, and they are never in the future
        match at_year(now.year()) {
            Some(t) if t <= now => Some(t),
            _ => at_year(now.year() - 1),
        }
    } else {
        let year = i32::from_str(time_or_year).ok()?;
        let dt = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        Some(dt.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{parse_list_line_at, split_fields};
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-15T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn parse(line: &str) -> Result<FtpEntry, FtpEntryParseError> {
        parse_list_line_at(line, now())
    }

    #[test]
    fn file_with_year() {
        let entry = parse("-rw-r--r--   1 ftp      ftp            14 Dec 01  2021 magic-file").unwrap();
        assert_eq!(entry.name, "magic-file");
        assert_eq!(entry.entry_type, FtpEntryType::File);
        assert_eq!(entry.size, 14);
        assert_eq!(
            entry.mtime.unwrap().to_rfc3339(),
            "2021-12-01T00:00:00+00:00"
        );
    }

    #[test]
    fn dir_without_year() {
        let entry = parse("drwxr-xr-x    2 ftp      ftp          4096 Mar 01 10:20 incoming").unwrap();
        assert!(entry.is_dir());
        assert_eq!(
            entry.mtime.unwrap().to_rfc3339(),
            "2024-03-01T10:20:00+00:00"
        );

        // a date after now belongs to last year
        let entry = parse("drwxr-xr-x    2 ftp      ftp          4096 Dec 24 10:20 incoming").unwrap();
        assert_eq!(
            entry.mtime.unwrap().to_rfc3339(),
            "2023-12-24T10:20:00+00:00"
        );
    }

    #[test]
    fn no_group_column() {
        let entry = parse("-rw-r--r-- 1 owner 1024 Jan 5 2020 my file.txt").unwrap();
        assert_eq!(entry.name, "my file.txt");
        assert_eq!(entry.size, 1024);
    }

    #[test]
    fn link() {
        let entry =
            parse("lrwxrwxrwx   1 root root  7 Jan  1 12:00 latest -> v1.2.3").unwrap();
        assert_eq!(entry.entry_type, FtpEntryType::Link);
        assert_eq!(entry.name, "latest");
        assert_eq!(entry.target.as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn bad_date_keeps_entry() {
        let entry = parse("-rw-r--r--   1 ftp ftp  14 Feb 30 2021 odd").unwrap();
        assert_eq!(entry.name, "odd");
        assert!(entry.mtime.is_none());

        let entry = parse("-rw-r--r--   1 ftp ftp  14 Xyz 30 2021 odd").unwrap();
        assert_eq!(entry.size, 14);
        assert!(entry.mtime.is_none());
    }

    #[test]
    fn not_entries() {
        assert_eq!(parse("total 12"), Err(FtpEntryParseError::NotAnEntry));
        assert_eq!(
            parse("-rw-r--r--   1 ftp ftp  x14 Jan 30 2021 f"),
            Err(FtpEntryParseError::InvalidSize)
        );
        assert_eq!(
            parse("-rw-r--r--   1 ftp ftp  14 Jan 30 2021"),
            Err(FtpEntryParseError::EmptyName)
        );
        assert_eq!(
            parse("?rw-r--r--   1 ftp ftp  14 Jan 30 2021 f"),
            Err(FtpEntryParseError::UnsupportedFormat)
        );
    }

    #[test]
    fn locate() {
        let fields = split_fields("-rw-r--r-- 1 a b 14 Jan 30 2021 f");
        assert_eq!(locate_month(&fields), Some(5));
        let fields = split_fields("-rw-r--r-- 1 a 14 Jan 30 2021 f");
        assert_eq!(locate_month(&fields), Some(4));
        let fields = split_fields("-rw-r--r-- 1 1000 mar 14 Jan 30 2021 f");
        assert_eq!(locate_month(&fields), Some(5));
        let fields = split_fields("-rw-r--r-- 1 a");
        assert_eq!(locate_month(&fields), None);
    }
}
