/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::SeekFrom;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use g3_ftp::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "get";

const COMMAND_ARG_REMOTE: &str = "remote";
const COMMAND_ARG_LOCAL: &str = "local";
const COMMAND_ARG_OFFSET: &str = "offset";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Download file, to stdout if no local file is given")
        .arg(
            Arg::new(COMMAND_ARG_REMOTE)
                .value_name("REMOTE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_LOCAL)
                .value_name("LOCAL FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(COMMAND_ARG_OFFSET)
                .help("start from this byte offset")
                .value_name("OFFSET")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .long(COMMAND_ARG_OFFSET),
        )
}

pub(super) async fn run<CP, S>(client: &mut FtpClient<CP, S>, args: &ArgMatches) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(remote) = args.get_one::<String>(COMMAND_ARG_REMOTE) else {
        return Err(anyhow!("no remote path set"));
    };
    let offset = args
        .get_one::<u64>(COMMAND_ARG_OFFSET)
        .copied()
        .unwrap_or_default();

    let mut stream = client.retr_from(remote, offset).await?;
    let copied = match args.get_one::<PathBuf>(COMMAND_ARG_LOCAL) {
        Some(local) => {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(offset == 0)
                .open(local)
                .await
                .map_err(|e| anyhow!("failed to open {}: {e}", local.display()))?;
            if offset > 0 {
                file.set_len(offset).await?;
                file.seek(SeekFrom::Start(offset)).await?;
            }
            let n = tokio::io::copy(&mut stream, &mut file).await?;
            file.flush().await?;
            n
        }
        None => {
            let mut stdout = tokio::io::stdout();
            let n = tokio::io::copy(&mut stream, &mut stdout).await?;
            stdout.flush().await?;
            n
        }
    };
    stream.close().await?;

    log::info!("received {copied} bytes of {remote}");
    Ok(())
}
