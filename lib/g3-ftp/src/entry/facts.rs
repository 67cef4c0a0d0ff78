/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use super::{FtpEntry, FtpEntryType, time_val};
use crate::error::FtpEntryParseError;

/// Parse a RFC 3659 fact line, as returned by MLSD or inside a MLST reply.
pub fn parse_facts_line(line: &str) -> Result<FtpEntry, FtpEntryParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(FtpEntryParseError::EmptyLine);
    }

    let Some((facts, name)) = line.split_once(' ') else {
        return Err(FtpEntryParseError::NoSpaceDelimiter);
    };
    if name.is_empty() {
        return Err(FtpEntryParseError::EmptyName);
    }

    let mut entry = FtpEntry::new(name, FtpEntryType::File);
    let mut is_entry = true;
    for fact in facts.split(';') {
        if fact.is_empty() {
            continue;
        }

        let Some((key, value)) = fact.split_once('=') else {
            return Err(FtpEntryParseError::NoDelimiterInFact(fact.to_string()));
        };
        match key.to_lowercase().as_str() {
            "type" => match value.to_lowercase().as_str() {
                "file" => entry.entry_type = FtpEntryType::File,
                "dir" => entry.entry_type = FtpEntryType::Folder,
                "cdir" | "pdir" => is_entry = false,
                t => {
                    if t.starts_with("os.unix=slink") || t.starts_with("os.unix=symlink") {
                        entry.entry_type = FtpEntryType::Link;
                        entry.target = value.split_once(':').map(|(_, v)| v.to_string());
                    }
                }
            },
            "size" => {
                entry.size = u64::from_str(value).map_err(|_| FtpEntryParseError::InvalidSize)?;
            }
            "modify" => entry.mtime = time_val::parse_from_str(value).ok(),
            _ => {}
        }
    }

    if is_entry {
        Ok(entry)
    } else {
        Err(FtpEntryParseError::NotAnEntry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file() {
        let entry =
            parse_facts_line("type=file;size=14;modify=20211201102030;UNIX.mode=0644; magic-file\r\n")
                .unwrap();
        assert_eq!(entry.name, "magic-file");
        assert_eq!(entry.entry_type, FtpEntryType::File);
        assert_eq!(entry.size, 14);
        assert_eq!(
            entry.mtime.unwrap().to_rfc3339(),
            "2021-12-01T10:20:30+00:00"
        );
    }

    #[test]
    fn dir_with_space_in_name() {
        let entry = parse_facts_line("Type=dir;Modify=20210525083610; my docs").unwrap();
        assert_eq!(entry.name, "my docs");
        assert!(entry.is_dir());
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn link() {
        let entry = parse_facts_line("type=OS.unix=slink:/Some/Target;size=3; lnk").unwrap();
        assert_eq!(entry.entry_type, FtpEntryType::Link);
        assert_eq!(entry.target.as_deref(), Some("/Some/Target"));
    }

    #[test]
    fn not_an_entry() {
        assert_eq!(
            parse_facts_line("type=pdir;sizd=4096;modify=20210525083610;unique=804g2; /"),
            Err(FtpEntryParseError::NotAnEntry)
        );
        assert_eq!(
            parse_facts_line("type=cdir;modify=20210525083610; ."),
            Err(FtpEntryParseError::NotAnEntry)
        );
    }

    #[test]
    fn bad_time_is_kept() {
        let entry = parse_facts_line("type=file;size=1;modify=2021xx01102030; f").unwrap();
        assert!(entry.mtime.is_none());
    }

    #[test]
    fn invalid() {
        assert_eq!(parse_facts_line(""), Err(FtpEntryParseError::EmptyLine));
        assert_eq!(
            parse_facts_line("type=file;size=1;"),
            Err(FtpEntryParseError::NoSpaceDelimiter)
        );
        assert_eq!(
            parse_facts_line("type=file;size=x; f"),
            Err(FtpEntryParseError::InvalidSize)
        );
        assert_eq!(
            parse_facts_line("type=file;size; f"),
            Err(FtpEntryParseError::NoDelimiterInFact("size".to_string()))
        );
        assert_eq!(
            parse_facts_line("type=file; "),
            Err(FtpEntryParseError::EmptyName)
        );
    }
}
