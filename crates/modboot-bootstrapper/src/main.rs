//! 模组引导程序命令行（宿主替身）。
//!
//! 职责：
//! - `early-start`：扫描模组目录，按确定顺序注册插件并输出注册结果
//! - `enable`：检测插件运行时，必要时安装，随后将引导模块部署到宿主插件目录
//! - `detect`：仅输出版本标记检测结果（不做修改）
//! - `doctor`：输出平台、安装包与目录推导结果（用于排障）
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modboot_bootstrapper::environment;
use modboot_bootstrapper::lifecycle::{Bootstrap, RuntimeStatus};
use modboot_core::config::{BootstrapConfig, DEFAULT_CONFIG_FILE};
use modboot_core::paths::HostLayout;
use modboot_core::platform::{InstallPackageDescriptor, PlatformTarget};
use modboot_loader::loader::LoadedPlugin;
use modboot_loader::ordering::RegistrationSink;

/// 命令行参数。
///
/// 说明：
/// - `config` 缺省为 `<mod_dir>/bootstrap.json`，文件不存在时使用默认配置
/// - `base_dir` 缺省为当前目录（宿主基础目录）
/// - `mod_dir` 缺省为可执行文件所在目录
#[derive(Debug, Parser)]
#[command(name = "modboot-bootstrapper", version)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    base_dir: Option<PathBuf>,

    #[arg(long)]
    mod_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// 支持的子命令。
#[derive(Debug, Subcommand)]
enum Commands {
    /// 早期启动：发现、加载并注册插件。
    EarlyStart,
    /// 启用：检测/安装运行时并自部署。
    Enable,
    /// 仅执行检测并输出结果（不做修改）。
    Detect,
    /// 环境自检（平台、安装包、目录）。
    Doctor,
}

/// 程序入口：解析参数并分发子命令。
///
/// 异常处理：
/// - 目录推导或配置读取失败返回 `Err`
/// - 引导流程内部的失败只记录日志，不影响退出码
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let bootstrap = load_bootstrap(&cli)?;
    match cli.command {
        Commands::EarlyStart => early_start(&bootstrap),
        Commands::Enable => enable(&bootstrap).await,
        Commands::Detect => detect(&bootstrap),
        Commands::Doctor => doctor(&bootstrap),
    }
}

fn load_bootstrap(cli: &Cli) -> Result<Bootstrap> {
    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("获取当前目录失败")?,
    };
    let mod_dir = match &cli.mod_dir {
        Some(dir) => dir.clone(),
        None => exe_dir()?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| mod_dir.join(DEFAULT_CONFIG_FILE));
    let config = BootstrapConfig::load(&config_path)?;
    Ok(Bootstrap::new(HostLayout::new(base_dir, mod_dir), config))
}

fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("获取可执行文件路径失败")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// 将注册顺序输出到标准输出，并持有插件实例直到进程退出。
#[derive(Default)]
struct StdoutSink {
    plugins: Vec<LoadedPlugin>,
}

impl RegistrationSink for StdoutSink {
    fn register_sorted(&mut self, plugins: Vec<LoadedPlugin>) {
        for plugin in &plugins {
            println!(
                "{} {} [{}] priority={} <- {}",
                plugin.info.name,
                plugin.info.version,
                plugin.info.author,
                plugin.info.priority,
                plugin.source.display()
            );
        }
        self.plugins.extend(plugins);
    }
}

fn early_start(bootstrap: &Bootstrap) -> Result<()> {
    let mut sink = StdoutSink::default();
    let summary = bootstrap.on_application_early_start(&mut sink);
    println!("registered = {}", summary.registered);
    Ok(())
}

async fn enable(bootstrap: &Bootstrap) -> Result<()> {
    let summary = bootstrap.on_enable().await;
    match &summary.runtime {
        RuntimeStatus::AlreadyInstalled => println!("runtime = already_installed"),
        RuntimeStatus::Installed { source } => println!("runtime = installed ({source:?})"),
        RuntimeStatus::Failed(reason) => println!("runtime = failed ({reason})"),
    }
    match &summary.deploy {
        Some(outcome) => println!("deploy = {outcome:?}"),
        None => println!("deploy = failed"),
    }
    Ok(())
}

fn detect(bootstrap: &Bootstrap) -> Result<()> {
    let marker = bootstrap.layout.marker_file(&bootstrap.config)?;
    let state = environment::check(&marker, &bootstrap.config.runtime.expected_version);
    println!(
        "installed_version = {}",
        state.installed_version.as_deref().unwrap_or("none")
    );
    println!("expected_version = {}", state.expected_version);
    println!("installed = {}", state.is_satisfied());
    Ok(())
}

fn doctor(bootstrap: &Bootstrap) -> Result<()> {
    let platform = PlatformTarget::current();
    println!("platform = {platform}");
    match InstallPackageDescriptor::for_platform(platform, &bootstrap.config.runtime) {
        Some(descriptor) => {
            println!("package = {}", descriptor.package_file_name);
            println!("download_url = {}", descriptor.download_url);
        }
        None => println!("package = unsupported"),
    }
    println!("base_dir = {}", bootstrap.layout.base_dir.display());
    println!("mod_dir = {}", bootstrap.layout.mod_dir.display());
    println!(
        "marker_file = {}",
        bootstrap.layout.marker_file(&bootstrap.config)?.display()
    );
    println!(
        "plugins_dir = {}",
        bootstrap.layout.plugins_dir(&bootstrap.config)?.display()
    );
    for root in bootstrap.discovery_roots() {
        println!("discovery_root = {} (exists={})", root.display(), root.is_dir());
    }
    Ok(())
}
