/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use g3_ftp::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "rmd";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_RECURSIVE: &str = "recursive";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Remove directory")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("DIR PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_RECURSIVE)
                .help("remove all files and directories in it")
                .action(ArgAction::SetTrue)
                .long(COMMAND_ARG_RECURSIVE)
                .short('r'),
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

    if args.get_flag(COMMAND_ARG_RECURSIVE) {
        client.remove_dir_recur(path).await?;
    } else {
        client.remove_dir(path).await?;
    }
    Ok(())
}
