/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, Command, value_parser};
use clap_complete::Shell;
use yaml_rust::YamlLoader;

use g3_ftp::{FtpClient, FtpClientConfig, TcpConnectionProvider};

mod logger;

mod cmd_del;
mod cmd_get;
mod cmd_list;
mod cmd_mkdir;
mod cmd_put;
mod cmd_rmd;
mod cmd_stat;
mod cmd_walk;

const DEFAULT_FTP_PORT: u16 = 21;

const GLOBAL_ARG_COMPLETION: &str = "completion";
const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_DISABLE_EPSV: &str = "disable-epsv";
const GLOBAL_ARG_TIMEOUT: &str = "timeout";
const GLOBAL_ARG_CONFIG: &str = "config";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

fn build_cli_args() -> Command {
    Command::new("g3ftp")
        .arg(
            Arg::new(GLOBAL_ARG_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTP server address, the port defaults to 21")
                .num_args(1)
                .value_name("SERVER ADDRESS")
                .required_unless_present(GLOBAL_ARG_COMPLETION),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_DISABLE_EPSV)
                .help("use PASV instead of EPSV")
                .action(ArgAction::SetTrue)
                .long(GLOBAL_ARG_DISABLE_EPSV)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_TIMEOUT)
                .help("connect and command timeout")
                .num_args(1)
                .value_name("TIMEOUT")
                .long(GLOBAL_ARG_TIMEOUT)
                .short('t')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CONFIG)
                .help("client config file in yaml format")
                .num_args(1)
                .value_name("CONFIG FILE")
                .value_parser(value_parser!(PathBuf))
                .long(GLOBAL_ARG_CONFIG)
                .short('c')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_VERBOSE)
                .help("show verbose message")
                .num_args(0)
                .action(ArgAction::Count)
                .short('v')
                .global(true),
        )
        .subcommand(cmd_list::command())
        .subcommand(cmd_walk::command())
        .subcommand(cmd_stat::command())
        .subcommand(cmd_get::command())
        .subcommand(cmd_put::command())
        .subcommand(cmd_del::command())
        .subcommand(cmd_mkdir::command())
        .subcommand(cmd_rmd::command())
}

fn server_with_port(server: &str) -> String {
    if server.parse::<SocketAddr>().is_ok() {
        return server.to_string();
    }
    if let Ok(ip) = server.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_FTP_PORT).to_string();
    }
    match server.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => server.to_string(),
        _ => format!("{server}:{DEFAULT_FTP_PORT}"),
    }
}

fn load_config(path: &PathBuf) -> anyhow::Result<FtpClientConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {e}", path.display()))?;
    let docs = YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    match docs.first() {
        Some(doc) => FtpClientConfig::parse_yaml(doc)
            .context(format!("invalid ftp client config in {}", path.display())),
        None => Ok(FtpClientConfig::default()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(GLOBAL_ARG_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    let logger = logger::SyncLogger::new(verbose_level);
    logger.into_global_logger()?;

    let Some(server) = args.get_one::<String>(GLOBAL_ARG_SERVER) else {
        return Err(anyhow!("no server address set"));
    };
    let server = server_with_port(server);

    let mut config = match args.get_one::<PathBuf>(GLOBAL_ARG_CONFIG) {
        Some(path) => load_config(path)?,
        None => FtpClientConfig::default(),
    };
    if let Some(s) = args.get_one::<String>(GLOBAL_ARG_TIMEOUT) {
        let timeout: Duration = humanize_rs::duration::parse(s)
            .map_err(|e| anyhow!("invalid timeout value {s}: {e:?}"))?;
        config.set_timeout(timeout);
    }
    if args.get_flag(GLOBAL_ARG_DISABLE_EPSV) {
        config.disable_epsv = true;
    }

    let username = args
        .get_one::<String>(GLOBAL_ARG_USERNAME)
        .map(|s| s.as_str())
        .unwrap_or("anonymous");
    let password = args
        .get_one::<String>(GLOBAL_ARG_PASSWORD)
        .map(|s| s.as_str())
        .unwrap_or_default();

    let mut conn_provider = TcpConnectionProvider::default();
    if let Some(ip) = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP) {
        conn_provider.set_bind_ip(*ip);
    }

    if let Some((subcommand, args)) = args.subcommand() {
        let mut client = FtpClient::connect_to(&server, conn_provider, config).await?;
        client.login(username, password).await?;

        let ret = match subcommand {
            cmd_list::COMMAND => cmd_list::run(&mut client, args).await,
            cmd_walk::COMMAND => cmd_walk::run(&mut client, args).await,
            cmd_stat::COMMAND => cmd_stat::run(&mut client, args).await,
            cmd_get::COMMAND => cmd_get::run(&mut client, args).await,
            cmd_put::COMMAND => cmd_put::run(&mut client, args).await,
            cmd_del::COMMAND => cmd_del::run(&mut client, args).await,
            cmd_mkdir::COMMAND => cmd_mkdir::run(&mut client, args).await,
            cmd_rmd::COMMAND => cmd_rmd::run(&mut client, args).await,
            cmd => Err(anyhow!("invalid subcommand {cmd}")),
        };

        client.quit().await?;

        ret
    } else {
        Err(anyhow!("no subcommand found"))
    }
}
