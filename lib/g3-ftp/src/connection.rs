/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpSocket, TcpStream};

/// The hook to open the connections used by a ftp session.
#[async_trait]
pub trait FtpConnectionProvider<T: AsyncRead + AsyncWrite> {
    /// Open the control connection to `server`, which is in host:port form.
    async fn new_control_connection(&mut self, server: &str) -> io::Result<T>;

    /// Open a data connection to `port`.
    ///
    /// `ip` is None if the data connection should go to the same host as the
    /// control connection.
    async fn new_data_connection(&mut self, ip: Option<IpAddr>, port: u16) -> io::Result<T>;
}

#[derive(Default)]
pub struct TcpConnectionProvider {
    bind_ip: Option<IpAddr>,
    remote_addr: Option<SocketAddr>,
}

impl TcpConnectionProvider {
    pub fn set_bind_ip(&mut self, ip: IpAddr) {
        self.bind_ip = Some(ip);
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    fn new_socket_to(&self, peer_ip: IpAddr) -> io::Result<TcpSocket> {
        let socket = match peer_ip {
            IpAddr::V4(_) => TcpSocket::new_v4()?,
            IpAddr::V6(_) => TcpSocket::new_v6()?,
        };
        if let Some(ip) = self.bind_ip {
            socket.bind(SocketAddr::new(ip, 0))?;
        }
        Ok(socket)
    }
}

#[async_trait]
impl FtpConnectionProvider<TcpStream> for TcpConnectionProvider {
    async fn new_control_connection(&mut self, server: &str) -> io::Result<TcpStream> {
        let mut err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no addr resolved");
        for addr in tokio::net::lookup_host(server).await? {
            let socket = self.new_socket_to(addr.ip())?;
            match socket.connect(addr).await {
                Ok(stream) => {
                    self.remote_addr = Some(addr);
                    return Ok(stream);
                }
                Err(e) => err = e,
            }
        }

        Err(err)
    }

    async fn new_data_connection(&mut self, ip: Option<IpAddr>, port: u16) -> io::Result<TcpStream> {
        let ip = match ip.or(self.remote_addr.map(|addr| addr.ip())) {
            Some(ip) => ip,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "no resolved server addr found",
                ));
            }
        };
        let socket = self.new_socket_to(ip)?;
        socket.connect(SocketAddr::new(ip, port)).await
    }
}
