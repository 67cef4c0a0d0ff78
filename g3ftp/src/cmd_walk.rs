/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncWrite};

use g3_ftp::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "walk";

const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_MAX_DEPTH: &str = "max-depth";
const COMMAND_ARG_LONG: &str = "long";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Walk the directory tree")
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("DIR PATH")
                .num_args(1),
        )
        .arg(
            Arg::new(COMMAND_ARG_MAX_DEPTH)
                .help("do not descend into directories deeper than this")
                .value_name("DEPTH")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .long(COMMAND_ARG_MAX_DEPTH),
        )
        .arg(
            Arg::new(COMMAND_ARG_LONG)
                .help("show type, size and modify time")
                .action(ArgAction::SetTrue)
                .long(COMMAND_ARG_LONG)
                .short('l'),
        )
}

pub(super) async fn run<CP, S>(client: &mut FtpClient<CP, S>, args: &ArgMatches) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let root = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or("/");
    let max_depth = args.get_one::<usize>(COMMAND_ARG_MAX_DEPTH).copied();
    let long = args.get_flag(COMMAND_ARG_LONG);

    let mut walker = client.walk(root);
    let root_depth = walker_depth(root);
    while walker.next().await {
        if let Some(e) = walker.err() {
            eprintln!("{}: {e}", walker.path());
            continue;
        }
        let Some(entry) = walker.stat() else {
            continue;
        };

        if long {
            let mtime = entry
                .mtime
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<6} {:>12} {mtime:<19} {}",
                entry.entry_type.as_str(),
                entry.size,
                walker.path()
            );
        } else {
            println!("{}", walker.path());
        }

        if entry.is_dir() {
            if let Some(max) = max_depth {
                if walker_depth(walker.path()) - root_depth >= max {
                    walker.skip_dir();
                }
            }
        }
    }
    Ok(())
}

fn walker_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}
