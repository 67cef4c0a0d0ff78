/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, Utc};
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::connection::{FtpConnectionProvider, TcpConnectionProvider};
use crate::control::{FtpAuthStatus, FtpControlChannel};
use crate::error::{FtpCommandError, FtpConnectError, FtpReplyKind};
use crate::feature::FtpServerFeature;
use crate::transfer::FtpTransferType;
use crate::walker::FtpWalker;
use crate::{FtpClientConfig, FtpEntry};

mod transfer;

#[cfg(test)]
pub(crate) mod testing;

/// A ftp session, which owns the control connection.
pub struct FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    config: FtpClientConfig,
    conn_provider: CP,
    control: FtpControlChannel<S>,
    server_feature: FtpServerFeature,
    epsv_rejected: bool,
}

pub type TcpFtpClient = FtpClient<TcpConnectionProvider, TcpStream>;

impl TcpFtpClient {
    /// Connect to `server` in host:port form over plain TCP.
    pub async fn connect(server: &str, config: FtpClientConfig) -> Result<Self, FtpConnectError> {
        FtpClient::connect_to(server, TcpConnectionProvider::default(), config).await
    }
}

impl<CP, S> FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(conn_provider: CP, stream: S, config: FtpClientConfig) -> Self {
        let control = FtpControlChannel::new(stream, config.control.clone());
        FtpClient {
            config,
            conn_provider,
            control,
            server_feature: FtpServerFeature::default(),
            epsv_rejected: false,
        }
    }

    pub async fn connect_to(
        server: &str,
        mut conn_provider: CP,
        config: FtpClientConfig,
    ) -> Result<Self, FtpConnectError> {
        let stream = match tokio::time::timeout(
            config.connect_timeout,
            conn_provider.new_control_connection(server),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(FtpConnectError::ConnectFailed(e)),
            Err(_) => return Err(FtpConnectError::ConnectTimedOut),
        };

        let mut client = FtpClient::new(conn_provider, stream, config);
        client.negotiate().await?;
        debug!("connected to ftp server {server}");
        Ok(client)
    }

    async fn negotiate(&mut self) -> Result<(), FtpConnectError> {
        match tokio::time::timeout(self.config.greeting_timeout, self.control.wait_greetings())
            .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return if e.reply().map(|r| r.kind()) == Some(FtpReplyKind::ServiceNotAvailable) {
                    Err(FtpConnectError::ServiceNotAvailable)
                } else {
                    Err(FtpConnectError::GreetingFailed(e))
                };
            }
            Err(_) => return Err(FtpConnectError::GreetingTimedOut),
        }

        self.server_feature = self
            .control
            .check_server_feature()
            .await
            .map_err(FtpConnectError::NegotiationFailed)?;

        if self.server_feature.support_utf8() && !self.config.disable_utf8 {
            let enabled = self
                .control
                .set_use_utf8()
                .await
                .map_err(FtpConnectError::NegotiationFailed)?;
            if !enabled {
                debug!("server advertised UTF8 but refused to enable it");
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_control_stream(conn_provider: CP, stream: S, config: FtpClientConfig) -> Self {
        FtpClient::new(conn_provider, stream, config)
    }

    #[inline]
    pub fn config(&self) -> &FtpClientConfig {
        &self.config
    }

    #[inline]
    pub fn features(&self) -> &FtpServerFeature {
        &self.server_feature
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.control.is_closed()
    }

    /// Log in and switch to binary transfer type.
    pub async fn login(&mut self, user: &str, pass: &str) -> Result<(), FtpCommandError> {
        match self.control.send_username(user).await? {
            FtpAuthStatus::LoggedIn => {}
            FtpAuthStatus::NeedPassword => self.control.send_password(pass).await?,
        }
        debug!("logged in as {user}");
        self.control
            .request_transfer_type(FtpTransferType::Image)
            .await
    }

    pub async fn noop(&mut self) -> Result<(), FtpCommandError> {
        self.control.noop().await
    }

    pub async fn change_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.change_dir(path).await
    }

    pub async fn change_dir_to_parent(&mut self) -> Result<(), FtpCommandError> {
        self.control.change_dir_to_parent().await
    }

    pub async fn current_dir(&mut self) -> Result<String, FtpCommandError> {
        self.control.current_dir().await
    }

    pub async fn rename(&mut self, from: &str, to: &str) -> Result<(), FtpCommandError> {
        self.control.rename_from(from).await?;
        self.control.rename_to(to).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.delete_file(path).await
    }

    pub async fn make_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.make_dir(path).await
    }

    pub async fn remove_dir(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.remove_dir(path).await
    }

    /// Get the size with SIZE. The server error is returned as is if the
    /// command fails.
    pub async fn file_size(&mut self, path: &str) -> Result<u64, FtpCommandError> {
        self.control.request_size(path).await
    }

    pub async fn mod_time(&mut self, path: &str) -> Result<DateTime<Utc>, FtpCommandError> {
        self.control.request_mtime(path).await
    }

    pub async fn get_entry(&mut self, path: &str) -> Result<FtpEntry, FtpCommandError> {
        self.control.request_mlst(path).await
    }

    /// Send QUIT and close the control connection.
    ///
    /// It is fine to call this on a closed session.
    pub async fn quit(&mut self) -> Result<(), FtpCommandError> {
        if self.control.is_closed() {
            return Ok(());
        }
        self.control.send_quit().await
    }

    /// Reset the session with REIN. Servers without REIN are not an error.
    pub async fn logout(&mut self) -> Result<(), FtpCommandError> {
        match self.control.send_rein().await {
            Err(e) if e.reply().map(|r| r.kind()) == Some(FtpReplyKind::NotImplemented) => {
                debug!("ignore REIN failure: {e}");
                Ok(())
            }
            r => r,
        }
    }

    /// Walk the tree at `root` depth first.
    pub fn walk(&mut self, root: &str) -> FtpWalker<'_, CP, S> {
        FtpWalker::new(self, root)
    }

    /// Remove the directory at `path` and everything below it.
    ///
    /// The first error stops the removal, and is returned as is.
    pub async fn remove_dir_recur(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let mut found = Vec::new();
        let mut walker = self.walk(path);
        while walker.next().await {
            if let Some(e) = walker.take_err() {
                return Err(e);
            }
            if let Some(entry) = walker.stat() {
                found.push((walker.path().to_string(), entry.is_dir()));
            }
        }

        // children always come after their parent
        for (p, is_dir) in found.iter().rev() {
            if *is_dir {
                self.control.remove_dir(p).await?;
            } else {
                self.control.delete_file(p).await?;
            }
        }
        self.control.remove_dir(path).await
    }
}
