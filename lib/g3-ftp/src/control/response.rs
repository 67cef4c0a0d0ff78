/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};

use super::{FtpCommand, FtpControlChannel};
use crate::error::{FtpRawResponseError, FtpReplyError};
use crate::io_ext::limited_read_until;

#[derive(Debug)]
pub(crate) enum FtpRawResponse {
    SingleLine(u16, String),
    MultiLine(u16, Vec<String>),
}

macro_rules! char_to_u16 {
    ($c:expr) => {
        ($c - b'0') as u16
    };
}

fn parse_reply_code(line: &[u8]) -> Result<u16, FtpRawResponseError> {
    if !line[..3].iter().all(|c| c.is_ascii_digit()) {
        return Err(FtpRawResponseError::InvalidLineFormat);
    }
    let code = char_to_u16!(line[0]) * 100 + char_to_u16!(line[1]) * 10 + char_to_u16!(line[2]);
    if !(100..600).contains(&code) {
        return Err(FtpRawResponseError::InvalidReplyCode(code));
    }
    Ok(code)
}

impl FtpRawResponse {
    pub(super) fn parse_single_line(line: &[u8]) -> Result<Self, FtpRawResponseError> {
        let code = parse_reply_code(line)?;
        let msg =
            std::str::from_utf8(&line[4..]).map_err(|_| FtpRawResponseError::LineIsNotUtf8)?;
        Ok(FtpRawResponse::SingleLine(code, msg.trim_end().to_string()))
    }

    pub(super) fn get_multi_line_parser(
        line: &[u8],
        max_lines: usize,
    ) -> Result<FtpMultiLineReplyParser, FtpRawResponseError> {
        let code = parse_reply_code(line)?;
        let end_prefix = [line[0], line[1], line[2], b' '];
        let mut lines = Vec::<String>::with_capacity(max_lines.min(16));
        let msg =
            std::str::from_utf8(&line[4..]).map_err(|_| FtpRawResponseError::LineIsNotUtf8)?;
        lines.push(msg.trim_end().to_string());
        Ok(FtpMultiLineReplyParser {
            code,
            end_prefix,
            lines,
        })
    }

    pub(crate) fn code(&self) -> u16 {
        match self {
            FtpRawResponse::SingleLine(code, _) => *code,
            FtpRawResponse::MultiLine(code, _) => *code,
        }
    }

    pub(super) fn line_trimmed(&self) -> Option<&str> {
        match self {
            FtpRawResponse::SingleLine(_, line) => Some(line.as_str().trim()),
            FtpRawResponse::MultiLine(_, _) => None,
        }
    }

    pub(super) fn lines(&self) -> Option<&[String]> {
        match self {
            FtpRawResponse::SingleLine(_, _) => None,
            FtpRawResponse::MultiLine(_, lines) => Some(lines),
        }
    }

    /// The full message text, multi-line replies joined with '\n'.
    #[cfg(test)]
    fn message(&self) -> String {
        match self {
            FtpRawResponse::SingleLine(_, line) => line.clone(),
            FtpRawResponse::MultiLine(_, lines) => lines.join("\n"),
        }
    }

    pub(crate) fn into_error(self, cmd: FtpCommand) -> FtpReplyError {
        match self {
            FtpRawResponse::SingleLine(code, line) => FtpReplyError::new(cmd, code, line),
            FtpRawResponse::MultiLine(code, lines) => {
                FtpReplyError::new(cmd, code, lines.join("\n"))
            }
        }
    }

    pub(super) fn parse_pasv_227_reply(&self) -> Option<SocketAddr> {
        let line = match self {
            FtpRawResponse::SingleLine(_, line) => line,
            FtpRawResponse::MultiLine(_, _) => return None,
        };

        // some servers omit the parentheses, so look for the first digit instead
        let p_start = match memchr::memchr(b'(', line.as_bytes()) {
            Some(p) => p + 1,
            None => line.find(|c: char| c.is_ascii_digit())?,
        };
        let p_end = line[p_start..]
            .find(|c: char| !(c.is_ascii_digit() || c == ','))
            .map(|p| p + p_start)
            .unwrap_or(line.len());

        let a: Vec<&str> = line[p_start..p_end].split(',').collect();
        if a.len() != 6 {
            return None;
        }

        let h1 = u8::from_str(a[0]).ok()?;
        let h2 = u8::from_str(a[1]).ok()?;
        let h3 = u8::from_str(a[2]).ok()?;
        let h4 = u8::from_str(a[3]).ok()?;
        let p1 = u8::from_str(a[4]).ok()?;
        let p2 = u8::from_str(a[5]).ok()?;

        let ip = IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4));
        let port = ((p1 as u16) << 8) + (p2 as u16);
        Some(SocketAddr::new(ip, port))
    }

    pub(super) fn parse_epsv_229_reply(&self) -> Option<u16> {
        let line = match self {
            FtpRawResponse::SingleLine(_, line) => line,
            FtpRawResponse::MultiLine(_, _) => return None,
        };

        if let Some(p_start) = memchr::memchr(b'(', line.as_bytes()) {
            if let Some(p_end) = memchr::memchr(b')', &line.as_bytes()[p_start..]) {
                let p_end = p_end + p_start;

                if !line[p_start + 1..p_end].starts_with("|||") {
                    return None;
                }
                if p_end - 1 <= p_start + 4 {
                    return None;
                }
                if line.as_bytes()[p_end - 1] != b'|' {
                    return None;
                }
                let port = u16::from_str(&line[p_start + 4..p_end - 1]).ok()?;
                return Some(port);
            }
        }

        None
    }

    /// Get the quoted path in a 257 reply, with doubled quotes unescaped.
    pub(super) fn parse_pwd_257_reply(&self) -> Option<String> {
        let line = match self {
            FtpRawResponse::SingleLine(_, line) => line.as_str(),
            FtpRawResponse::MultiLine(_, lines) => lines.first()?.as_str(),
        };

        let p_start = memchr::memchr(b'"', line.as_bytes())?;
        let mut path = String::with_capacity(line.len());
        let mut chars = line[p_start + 1..].chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    path.push('"');
                } else {
                    return Some(path);
                }
            } else {
                path.push(c);
            }
        }

        None
    }
}

pub(super) struct FtpMultiLineReplyParser {
    code: u16,
    end_prefix: [u8; 4],
    lines: Vec<String>,
}

impl FtpMultiLineReplyParser {
    fn is_end_line(&self, line: &[u8]) -> bool {
        if line.starts_with(&self.end_prefix) {
            return true;
        }
        // a bare "<code>\r\n" also ends the reply
        line.starts_with(&self.end_prefix[..3]) && line[3..].iter().all(|c| *c == b'\r' || *c == b'\n')
    }

    pub(super) fn feed_line(&mut self, line: &[u8]) -> Result<bool, FtpRawResponseError> {
        if self.is_end_line(line) {
            let msg = if line.len() > 4 { &line[4..] } else { &[] };
            let msg = std::str::from_utf8(msg).map_err(|_| FtpRawResponseError::LineIsNotUtf8)?;
            self.lines.push(msg.trim_end().to_string());
            Ok(true)
        } else {
            let msg = std::str::from_utf8(line).map_err(|_| FtpRawResponseError::LineIsNotUtf8)?;
            // do not trim whitespace at beginning
            self.lines.push(msg.trim_end().to_string());
            Ok(false)
        }
    }

    pub(super) fn finish(self) -> FtpRawResponse {
        FtpRawResponse::MultiLine(self.code, self.lines)
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_first_line(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpRawResponseError> {
        buf.clear();

        let (found, len) =
            limited_read_until(&mut self.stream, b'\n', self.config.max_line_len, buf)
                .await
                .map_err(FtpRawResponseError::ReadFailed)?;

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(buf);

        match len {
            0 => Err(FtpRawResponseError::ConnectionClosed),
            1..=4 => {
                // at least <code>\n
                Err(FtpRawResponseError::InvalidLineFormat)
            }
            _ => {
                if !found {
                    Err(FtpRawResponseError::LineTooLong)
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn read_extra_line(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpRawResponseError> {
        buf.clear();

        let (found, len) =
            limited_read_until(&mut self.stream, b'\n', self.config.max_line_len, buf)
                .await
                .map_err(FtpRawResponseError::ReadFailed)?;

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(buf);

        match len {
            0 => Err(FtpRawResponseError::ConnectionClosed),
            _ => {
                if !found {
                    Err(FtpRawResponseError::LineTooLong)
                } else {
                    Ok(())
                }
            }
        }
    }

    pub(super) async fn read_raw_response(
        &mut self,
    ) -> Result<FtpRawResponse, FtpRawResponseError> {
        let mut buf = Vec::<u8>::with_capacity(self.config.max_line_len);
        self.read_first_line(&mut buf).await?;

        match buf[3] {
            b' ' => FtpRawResponse::parse_single_line(&buf),
            b'-' => {
                let mut ml_parser =
                    FtpRawResponse::get_multi_line_parser(&buf, self.config.max_multi_lines)?;
                for _i in 0..self.config.max_multi_lines {
                    self.read_extra_line(&mut buf).await?;
                    let end = ml_parser.feed_line(&buf)?;
                    if end {
                        return Ok(ml_parser.finish());
                    }
                }
                Err(FtpRawResponseError::TooManyLines)
            }
            _ => Err(FtpRawResponseError::InvalidLineFormat),
        }
    }

    pub(super) async fn timed_read_raw_response(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpRawResponse, FtpRawResponseError> {
        let r = match tokio::time::timeout(self.config.command_timeout, self.read_raw_response())
            .await
        {
            Ok(r) => r,
            Err(_) => Err(FtpRawResponseError::ReadResponseTimedOut(stage)),
        };
        if r.is_err() {
            // a late or partial reply would be taken as the reply to the next command
            self.closed = true;
        }
        r
    }
}
