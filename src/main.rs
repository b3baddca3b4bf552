use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tiny_tabletd::config::Config;
use tiny_tabletd::event_dispatcher::{CoordinateMapper, UinputPointer};
use tiny_tabletd::input_devices::{hotplug, usb};
use tiny_tabletd::tablet_driver::{Connection, HotplugWatcher, TABLET_IDENTITY, reader, shutdown};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML 配置文件，不指定时使用默认配置
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 提高日志级别，可重复
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 运行驱动（默认）
    Run,
    /// 列出 HID 类 USB 设备
    List,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let conf = Config::load_or_default(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("无法创建 tokio 运行时")?;
            shutdown::run_until(
                runtime,
                run(conf),
                tokio::signal::ctrl_c(),
                shutdown::SHUTDOWN_GRACE,
            )
        }
        Command::List => list(&conf),
    }
}

async fn run(conf: Config) -> Result<()> {
    let context = rusb::Context::new().context("无法初始化 libusb")?;
    let source = Arc::new(usb::UsbSource::new(context.clone(), &conf.usb));
    let connection = Arc::new(Connection::new());
    let watcher = Arc::new(HotplugWatcher::new(source.clone(), connection.clone()));
    let pointer = UinputPointer::create(&conf.pointer.name).context("无法创建虚拟指针设备")?;

    // 先注册热插拔再枚举，枚举期间插入的设备不会丢；重复的到达会被 watcher 忽略
    let (tx, rx) = mpsc::unbounded_channel();
    let _registration = match hotplug::register(&context, tx.clone()).context("无法注册热插拔通知")? {
        Some(registration) => {
            hotplug::spawn_event_thread(context.clone()).context("无法启动 libusb 事件线程")?;
            Some(registration)
        }
        None => {
            tokio::spawn(hotplug::poll_arrivals(
                source.clone(),
                tx.clone(),
                conf.hotplug.poll_interval(),
            ));
            None
        }
    };
    drop(tx);

    let scan = watcher.clone();
    match tokio::task::spawn_blocking(move || scan.scan_present()).await? {
        Ok(true) => {}
        Ok(false) => info!("Waiting for tablet {TABLET_IDENTITY}..."),
        Err(e) => warn!("initial enumeration failed: {e}"),
    }
    tokio::spawn(watcher.run(rx));

    reader::run(&connection, pointer, CoordinateMapper::default()).await;
    Ok(())
}

fn list(conf: &Config) -> Result<()> {
    let context = rusb::Context::new().context("无法初始化 libusb")?;
    let source = usb::UsbSource::new(context, &conf.usb);
    for candidate in usb::list_candidates(&source).context("无法枚举 USB 设备")? {
        let (identity, matched) = match candidate.identity {
            Some(identity) => (identity.to_string(), identity == TABLET_IDENTITY),
            None => ("????:????".to_string(), false),
        };
        println!(
            "bus {:03} device {:03} id {}{}",
            candidate.bus,
            candidate.address,
            identity,
            if matched { "  <- tablet" } else { "" }
        );
    }
    Ok(())
}
