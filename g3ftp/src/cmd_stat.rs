/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use g3_ftp::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "stat";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Fetch file stats").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("PATH")
            .num_args(1)
            .required(true),
    )
}

pub(super) async fn run<CP, S>(client: &mut FtpClient<CP, S>, args: &ArgMatches) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();

    if client.features().support_mlst() {
        let entry = client.get_entry(path).await?;
        println!("Path: {path}");
        println!("Type: {}", entry.entry_type);
        println!("Size: {}", entry.size);
        if let Some(dt) = entry.mtime {
            println!("Modify Time: {dt}");
        }
        if let Some(target) = entry.target {
            println!("Link Target: {target}");
        }
    } else {
        let size = client.file_size(path).await?;
        println!("Path: {path}");
        println!("Size: {size}");
        if client.features().support_mdtm() {
            let dt = client.mod_time(path).await?;
            println!("Modify Time: {dt}");
        }
    }

    Ok(())
}
