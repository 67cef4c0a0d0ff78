/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::VecDeque;
use std::io;
use std::net::IpAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

use super::FtpClient;
use crate::FtpClientConfig;
use crate::connection::FtpConnectionProvider;

/// Serve data connections from in memory pipes, in the order they are added.
#[derive(Default)]
pub(crate) struct DuplexProvider {
    control: Option<DuplexStream>,
    data: VecDeque<DuplexStream>,
    pub(crate) dialed: Vec<(Option<IpAddr>, u16)>,
}

impl DuplexProvider {
    /// Set the control connection, which is pre-filled with `replies`.
    pub(crate) async fn set_control(&mut self, replies: &[u8]) -> DuplexStream {
        let (client, mut server) = duplex(8192);
        server.write_all(replies).await.unwrap();
        self.control = Some(client);
        server
    }

    /// Add a download data connection which sends `content` and then EOF.
    pub(crate) async fn add_data(&mut self, content: &[u8]) {
        let (client, mut server) = duplex(8192);
        server.write_all(content).await.unwrap();
        self.data.push_back(client);
    }

    /// Add an upload data connection, and return the server side of it.
    pub(crate) fn add_upload(&mut self) -> DuplexStream {
        let (client, server) = duplex(8192);
        self.data.push_back(client);
        server
    }
}

#[async_trait]
impl FtpConnectionProvider<DuplexStream> for DuplexProvider {
    async fn new_control_connection(&mut self, _server: &str) -> io::Result<DuplexStream> {
        self.control
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }

    async fn new_data_connection(
        &mut self,
        ip: Option<IpAddr>,
        port: u16,
    ) -> io::Result<DuplexStream> {
        self.dialed.push((ip, port));
        self.data
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }
}

/// Create a client whose control connection is pre-filled with
/// `replies`. The server side of the control connection is returned.
pub(crate) async fn client_with(
    replies: &[u8],
    provider: DuplexProvider,
    config: FtpClientConfig,
) -> (FtpClient<DuplexProvider, DuplexStream>, DuplexStream) {
    let (client, mut server) = duplex(8192);
    server.write_all(replies).await.unwrap();
    let client = FtpClient::with_control_stream(provider, client, config);
    (client, server)
}

/// Read all commands sent by the client. The client must have been dropped.
pub(crate) async fn sent_commands(mut server: DuplexStream) -> String {
    let mut buf = String::new();
    server.read_to_string(&mut buf).await.unwrap();
    buf
}
