/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncWrite};

use g3_ftp::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "put";

const COMMAND_ARG_LOCAL: &str = "local";
const COMMAND_ARG_REMOTE: &str = "remote";
const COMMAND_ARG_APPEND: &str = "append";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Upload file")
        .arg(
            Arg::new(COMMAND_ARG_LOCAL)
                .value_name("LOCAL FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_REMOTE)
                .value_name("REMOTE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_APPEND)
                .help("append to the remote file")
                .action(ArgAction::SetTrue)
                .long(COMMAND_ARG_APPEND)
                .short('a'),
        )
}

pub(super) async fn run<CP, S>(client: &mut FtpClient<CP, S>, args: &ArgMatches) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(local) = args.get_one::<PathBuf>(COMMAND_ARG_LOCAL) else {
        return Err(anyhow!("no local file set"));
    };
    let Some(remote) = args.get_one::<String>(COMMAND_ARG_REMOTE) else {
        return Err(anyhow!("no remote path set"));
    };

    let mut file = tokio::fs::File::open(local)
        .await
        .map_err(|e| anyhow!("failed to open {}: {e}", local.display()))?;
    let sent = if args.get_flag(COMMAND_ARG_APPEND) {
        client.append(remote, &mut file).await?
    } else {
        client.stor(remote, &mut file).await?
    };

    log::info!("sent {sent} bytes to {remote}");
    Ok(())
}
