/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::FtpConnectionProvider;
use crate::error::FtpCommandError;
use crate::{FtpClient, FtpEntry};

struct WalkItem {
    path: String,
    /// None for the root, which is not listed by its parent
    entry: Option<FtpEntry>,
    err: Option<FtpCommandError>,
}

impl WalkItem {
    fn is_dir(&self) -> bool {
        self.entry.as_ref().map(|e| e.is_dir()).unwrap_or(true)
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.ends_with('/') {
            format!("{}{name}", self.path)
        } else {
            format!("{}/{name}", self.path)
        }
    }
}

/// Depth first traversal of a remote directory tree.
///
/// Entries are yielded in pre-order, and the children of a directory come in
/// the order the server lists them. The root itself is not yielded, unless
/// listing it fails.
///
/// ```no_run
/// # async fn walk(client: &mut g3_ftp::TcpFtpClient) {
/// let mut walker = client.walk("/pub");
/// while walker.next().await {
///     if let Some(e) = walker.err() {
///         eprintln!("{}: {e}", walker.path());
///         continue;
///     }
///     println!("{}", walker.path());
/// }
/// # }
/// ```
pub struct FtpWalker<'a, CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    client: &'a mut FtpClient<CP, S>,
    root: String,
    cur: Option<WalkItem>,
    stack: Vec<WalkItem>,
    descend: bool,
    started: bool,
}

impl<'a, CP, S> FtpWalker<'a, CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(client: &'a mut FtpClient<CP, S>, root: &str) -> Self {
        let mut root = root.trim_end_matches('/').to_string();
        root.push('/');
        FtpWalker {
            client,
            root,
            cur: None,
            stack: Vec::new(),
            descend: true,
            started: false,
        }
    }

    /// Move to the next item. Return false if the traversal is finished.
    ///
    /// The directory of the current item is listed first, unless
    /// [`skip_dir`](Self::skip_dir) has been called. If the listing fails,
    /// the directory is yielded again with the error set.
    pub async fn next(&mut self) -> bool {
        if !self.started {
            self.started = true;
            self.cur = Some(WalkItem {
                path: self.root.clone(),
                entry: None,
                err: None,
            });
        }

        if self.descend {
            if let Some(cur) = self.cur.as_mut() {
                if cur.err.is_none() && cur.is_dir() {
                    match self.client.list(&cur.path).await {
                        Ok(entries) => {
                            for entry in entries.into_iter().rev() {
                                self.stack.push(WalkItem {
                                    path: cur.child_path(&entry.name),
                                    entry: Some(entry),
                                    err: None,
                                });
                            }
                        }
                        Err(e) => {
                            debug!("failed to list {}: {e}", cur.path);
                            cur.err = Some(e);
                            self.descend = false;
                            return true;
                        }
                    }
                }
            }
        }

        match self.stack.pop() {
            Some(item) => {
                self.cur = Some(item);
                self.descend = true;
                true
            }
            None => {
                self.cur = None;
                false
            }
        }
    }

    /// Do not descend into the current directory.
    pub fn skip_dir(&mut self) {
        if self.cur.is_some() {
            self.descend = false;
        }
    }

    /// The absolute path of the current item, or empty if there is none.
    pub fn path(&self) -> &str {
        self.cur.as_ref().map(|item| item.path.as_str()).unwrap_or("")
    }

    /// The entry of the current item. It is None for the root.
    pub fn stat(&self) -> Option<&FtpEntry> {
        self.cur.as_ref().and_then(|item| item.entry.as_ref())
    }

    pub fn err(&self) -> Option<&FtpCommandError> {
        self.cur.as_ref().and_then(|item| item.err.as_ref())
    }

    pub(crate) fn take_err(&mut self) -> Option<FtpCommandError> {
        self.cur.as_mut().and_then(|item| item.err.take())
    }
}
