/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const MODIFY_TIME: &str = "20211201102030";

enum Node {
    Dir,
    File(Vec<u8>),
}

struct MockFs {
    nodes: BTreeMap<String, Node>,
}

impl MockFs {
    fn new() -> Self {
        let mut nodes = BTreeMap::new();
        for dir in ["/", "/incoming", "/root", "/testDir", "/testDir/sub"] {
            nodes.insert(dir.to_string(), Node::Dir);
        }
        nodes.insert("/incoming/magic-file".to_string(), Node::File(vec![b'x'; 42]));
        nodes.insert("/root/lo".to_string(), Node::File(b"lo".to_vec()));
        nodes.insert("/testDir/file1".to_string(), Node::File(b"1".to_vec()));
        nodes.insert("/testDir/sub/file2".to_string(), Node::File(b"2".to_vec()));
        MockFs { nodes }
    }

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.get(path), Some(Node::Dir))
    }

    fn file(&self, path: &str) -> Option<&Vec<u8>> {
        match self.nodes.get(path) {
            Some(Node::File(data)) => Some(data),
            _ => None,
        }
    }

    fn children(&self, dir: &str) -> Vec<(String, &Node)> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        self.nodes
            .iter()
            .filter_map(|(p, node)| {
                let name = p.strip_prefix(&prefix)?;
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some((name.to_string(), node))
            })
            .collect()
    }
}

fn resolve(cwd: &str, path: &str) -> String {
    let mut parts: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        cwd.split('/').filter(|s| !s.is_empty()).collect()
    };
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

fn not_found(path: &str) -> String {
    format!("550 {}: No such file or directory", path.trim_end_matches('/'))
}

/// A single connection FTP server with an in memory file system.
pub struct MockServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    fs: Arc<Mutex<MockFs>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        MockServer::start_with(false).await
    }

    /// Start a server which advertises MLST and serves MLSD.
    pub async fn start_with_mlst() -> Self {
        MockServer::start_with(true).await
    }

    async fn start_with(mlst: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let fs = Arc::new(Mutex::new(MockFs::new()));

        let session_commands = commands.clone();
        let session_fs = fs.clone();
        let handle = tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let (r, w) = stream.into_split();
            let mut session = Session {
                fs: session_fs,
                commands: session_commands,
                mlst,
                cwd: "/".to_string(),
                data_listener: None,
                rest: 0,
                rename_from: None,
                writer: w,
            };
            session.run(BufReader::new(r)).await;
        });

        MockServer {
            addr,
            commands,
            fs,
            handle,
        }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// All received command lines, without the line ending.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.fs.lock().unwrap().nodes.contains_key(path)
    }

    /// Wait for the client to close the connection.
    pub async fn wait(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), &mut self.handle)
            .await
            .expect("mock session not finished")
            .unwrap();
    }
}

struct Session {
    fs: Arc<Mutex<MockFs>>,
    commands: Arc<Mutex<Vec<String>>>,
    mlst: bool,
    cwd: String,
    data_listener: Option<TcpListener>,
    rest: u64,
    rename_from: Option<String>,
    writer: OwnedWriteHalf,
}

impl Session {
    async fn reply(&mut self, msg: &str) {
        let _ = self.writer.write_all(msg.as_bytes()).await;
        let _ = self.writer.write_all(b"\r\n").await;
    }

    async fn run(&mut self, mut reader: BufReader<tokio::net::tcp::OwnedReadHalf>) {
        self.reply("220 (mock ftpd)").await;

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            self.commands.lock().unwrap().push(line.clone());

            let (cmd, arg) = match line.split_once(' ') {
                Some((cmd, arg)) => (cmd.to_uppercase(), arg.to_string()),
                None => (line.to_uppercase(), String::new()),
            };
            if !self.handle(&cmd, &arg).await {
                let _ = self.writer.shutdown().await;
                return;
            }
        }
    }

    async fn open_passive(&mut self) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        self.data_listener = Some(listener);
        port
    }

    async fn accept_data(&mut self) -> Option<TcpStream> {
        let listener = self.data_listener.take()?;
        match tokio::time::timeout(Duration::from_secs(5), listener.accept()).await {
            Ok(Ok((stream, _))) => Some(stream),
            _ => None,
        }
    }

    async fn send_data(&mut self, data: &[u8], start_msg: &str, end_msg: &str) {
        self.reply(start_msg).await;
        match self.accept_data().await {
            Some(mut stream) => {
                let _ = stream.write_all(data).await;
                let _ = stream.shutdown().await;
                drop(stream);
                self.reply(end_msg).await;
            }
            None => self.reply("425 Failed to establish connection.").await,
        }
    }

    fn listing(&self, dir: &str, cmd: &str) -> Vec<u8> {
        let fs = self.fs.lock().unwrap();
        let mut out = String::new();
        for (name, node) in fs.children(dir) {
            let line = match (cmd, node) {
                ("NLST", _) => format!("{}\r\n", resolve(dir, &name)),
                ("MLSD", Node::Dir) => format!("type=dir;modify={MODIFY_TIME}; {name}\r\n"),
                ("MLSD", Node::File(data)) => format!(
                    "type=file;size={};modify={MODIFY_TIME}; {name}\r\n",
                    data.len()
                ),
                (_, Node::Dir) => {
                    format!("drwxr-xr-x    2 0        0            4096 Dec 01  2021 {name}\r\n")
                }
                (_, Node::File(data)) => format!(
                    "-rw-r--r--    1 0        0        {:>8} Dec 01  2021 {name}\r\n",
                    data.len()
                ),
            };
            out.push_str(&line);
        }
        out.into_bytes()
    }

    async fn handle(&mut self, cmd: &str, arg: &str) -> bool {
        let path = resolve(&self.cwd, arg);
        match cmd {
            "USER" => {
                if arg == "anonymous" {
                    self.reply("331 Please specify the password.").await
                } else {
                    self.reply("530 This FTP server is anonymous only.").await
                }
            }
            "PASS" => self.reply("230 Login successful.").await,
            "FEAT" => {
                let mut msg = String::from("211-Features:\r\n EPSV\r\n MDTM\r\n PASV\r\n");
                if self.mlst {
                    msg.push_str(" MLST type*;size*;modify*;\r\n");
                }
                msg.push_str(" REST STREAM\r\n SIZE\r\n UTF8\r\n211 End");
                self.reply(&msg).await
            }
            "OPTS" => self.reply("200 Always in UTF8 mode.").await,
            "TYPE" => self.reply("200 Switching to Binary mode.").await,
            "NOOP" => self.reply("200 NOOP ok.").await,
            "PWD" => {
                let msg = format!("257 \"{}\" is the current directory", self.cwd);
                self.reply(&msg).await
            }
            "CWD" => {
                let is_dir = self.fs.lock().unwrap().is_dir(&path);
                if is_dir {
                    self.cwd = path;
                    self.reply("250 Directory successfully changed.").await
                } else {
                    self.reply(&not_found(arg)).await
                }
            }
            "CDUP" => {
                self.cwd = resolve(&self.cwd, "..");
                self.reply("250 Directory successfully changed.").await
            }
            "EPSV" => {
                let port = self.open_passive().await;
                let msg = format!("229 Entering Extended Passive Mode (|||{port}|)");
                self.reply(&msg).await
            }
            "PASV" => {
                let port = self.open_passive().await;
                let msg = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{}).",
                    port >> 8,
                    port & 0xff
                );
                self.reply(&msg).await
            }
            "REST" => match arg.parse::<u64>() {
                Ok(n) => {
                    self.rest = n;
                    let msg = format!("350 Restart position accepted ({n}).");
                    self.reply(&msg).await
                }
                Err(_) => self.reply("554 Invalid REST parameter.").await,
            },
            "RETR" => {
                let offset = std::mem::take(&mut self.rest) as usize;
                let data = self.fs.lock().unwrap().file(&path).cloned();
                match data {
                    Some(data) => {
                        let start = offset.min(data.len());
                        self.send_data(
                            &data[start..],
                            "150 Opening BINARY mode data connection.",
                            "226 Transfer complete.",
                        )
                        .await
                    }
                    None => {
                        self.data_listener = None;
                        self.reply("550 Failed to open file.").await
                    }
                }
            }
            "STOR" | "APPE" => {
                let offset = std::mem::take(&mut self.rest) as usize;
                self.reply("150 Ok to send data.").await;
                let Some(mut stream) = self.accept_data().await else {
                    self.reply("425 Failed to establish connection.").await;
                    return true;
                };
                let mut received = Vec::new();
                let _ = stream.read_to_end(&mut received).await;
                {
                    let mut fs = self.fs.lock().unwrap();
                    let mut data = fs.file(&path).cloned().unwrap_or_default();
                    if cmd == "STOR" {
                        data.truncate(offset);
                    }
                    data.extend_from_slice(&received);
                    fs.nodes.insert(path, Node::File(data));
                }
                self.reply("226 Transfer complete.").await
            }
            "LIST" | "NLST" | "MLSD" => {
                let is_dir = self.fs.lock().unwrap().is_dir(&path);
                if is_dir {
                    let data = self.listing(&path, cmd);
                    self.send_data(
                        &data,
                        "150 Here comes the directory listing.",
                        "226 Directory send OK.",
                    )
                    .await
                } else {
                    self.data_listener = None;
                    self.reply(&not_found(arg)).await
                }
            }
            "RNFR" => {
                let exists = self.fs.lock().unwrap().nodes.contains_key(&path);
                if exists {
                    self.rename_from = Some(path);
                    self.reply("350 Ready for RNTO.").await
                } else {
                    self.reply("550 RNFR command failed.").await
                }
            }
            "RNTO" => match self.rename_from.take() {
                Some(from) => {
                    {
                        let mut fs = self.fs.lock().unwrap();
                        if let Some(node) = fs.nodes.remove(&from) {
                            fs.nodes.insert(path, node);
                        }
                    }
                    self.reply("250 Rename successful.").await
                }
                None => self.reply("503 RNFR required first.").await,
            },
            "DELE" => {
                let removed = {
                    let mut fs = self.fs.lock().unwrap();
                    if fs.file(&path).is_some() {
                        fs.nodes.remove(&path).is_some()
                    } else {
                        false
                    }
                };
                if removed {
                    self.reply("250 Delete operation successful.").await
                } else {
                    self.reply("550 Delete operation failed.").await
                }
            }
            "MKD" => {
                let created = {
                    let mut fs = self.fs.lock().unwrap();
                    if fs.nodes.contains_key(&path) {
                        false
                    } else {
                        fs.nodes.insert(path.clone(), Node::Dir);
                        true
                    }
                };
                if created {
                    let msg = format!("257 \"{path}\" created");
                    self.reply(&msg).await
                } else {
                    self.reply("550 Create directory operation failed.").await
                }
            }
            "RMD" => {
                let removed = {
                    let mut fs = self.fs.lock().unwrap();
                    if fs.is_dir(&path) && fs.children(&path).is_empty() {
                        fs.nodes.remove(&path);
                        true
                    } else {
                        false
                    }
                };
                if removed {
                    self.reply("250 Remove directory operation successful.")
                        .await
                } else {
                    self.reply("550 Remove directory operation failed.").await
                }
            }
            "SIZE" => {
                let size = self.fs.lock().unwrap().file(&path).map(|d| d.len());
                match size {
                    Some(n) => self.reply(&format!("213 {n}")).await,
                    None => self.reply("550 Could not get file size.").await,
                }
            }
            "MDTM" => {
                let exists = self.fs.lock().unwrap().file(&path).is_some();
                if exists {
                    self.reply(&format!("213 {MODIFY_TIME}")).await
                } else {
                    self.reply("550 Could not get file modification time.")
                        .await
                }
            }
            "MLST" => {
                let fact = {
                    let fs = self.fs.lock().unwrap();
                    match fs.nodes.get(&path) {
                        Some(Node::Dir) => Some(format!("type=dir;modify={MODIFY_TIME};")),
                        Some(Node::File(data)) => Some(format!(
                            "type=file;size={};modify={MODIFY_TIME};",
                            data.len()
                        )),
                        None => None,
                    }
                };
                match fact {
                    Some(fact) => {
                        let msg = format!("250- Listing {arg}\r\n {fact} {path}\r\n250 End");
                        self.reply(&msg).await
                    }
                    None => self.reply(&not_found(arg)).await,
                }
            }
            "REIN" => self.reply("502 REIN not implemented.").await,
            "QUIT" => {
                self.reply("221 Goodbye.").await;
                return false;
            }
            _ => self.reply("500 Unknown command.").await,
        }
        true
    }
}
