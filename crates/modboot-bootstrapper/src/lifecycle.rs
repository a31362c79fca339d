//! 宿主生命周期入口。
//!
//! - 早期启动：扫描共享内容目录与本地模组目录，加载符合契约的模块并按确定顺序注册
//! - 启用：检测运行时环境，必要时安装；随后执行自部署
//!
//! 两个流程都不会向宿主抛出错误：单项失败记录日志后跳过，安装流程失败在流程边界处理，
//! 下一次启用时重新检测。
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::PathBuf;

use modboot_core::config::BootstrapConfig;
use modboot_core::paths::HostLayout;
use modboot_loader::discovery::DiscoveryPipeline;
use modboot_loader::inspector::{ExportTableInspector, MetadataInspector};
use modboot_loader::loader::{ModuleLoader, NativeModuleLoader};
use modboot_loader::ordering::{self, RegistrationSink};
use tracing::{error, info, warn};

use crate::deploy::{self, DeployOutcome};
use crate::environment;
use crate::installer::{Installer, PackageSource};

/// 早期启动结果摘要（诊断用）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupSummary {
    pub registered: usize,
    pub missing_roots: Vec<PathBuf>,
    pub skipped: usize,
    pub unreadable: usize,
    pub failed: usize,
}

/// 启用流程中运行时环境的处理结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeStatus {
    AlreadyInstalled,
    Installed { source: PackageSource },
    /// 安装失败（已记录日志），下次启用时重试。
    Failed(String),
}

/// 启用流程结果摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableSummary {
    pub runtime: RuntimeStatus,
    /// 自部署失败时为 `None`。
    pub deploy: Option<DeployOutcome>,
}

/// 引导程序实例：宿主目录布局 + 配置。
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub layout: HostLayout,
    pub config: BootstrapConfig,
}

impl Bootstrap {
    pub fn new(layout: HostLayout, config: BootstrapConfig) -> Self {
        Self { layout, config }
    }

    /// 发现根目录（按顺序）：共享内容目录、本地模组目录。
    ///
    /// 无法推导的根目录记录警告后跳过。
    pub fn discovery_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(2);
        match self.layout.shared_content_root(&self.config) {
            Some(root) => roots.push(root),
            None => warn!(
                "无法确定 SteamApps 目录，跳过共享内容目录 (base={})",
                self.layout.base_dir.display()
            ),
        }
        match self.layout.mods_root(&self.config) {
            Ok(root) => roots.push(root),
            Err(err) => warn!("本地模组目录配置无效，跳过: {err:#}"),
        }
        roots
    }

    /// 早期启动：使用导出表检查与动态库加载。
    pub fn on_application_early_start(&self, sink: &mut dyn RegistrationSink) -> StartupSummary {
        self.early_start_with(ExportTableInspector, NativeModuleLoader, sink)
    }

    /// 早期启动（可替换检查/加载实现）。
    pub fn early_start_with<I, L>(
        &self,
        inspector: I,
        loader: L,
        sink: &mut dyn RegistrationSink,
    ) -> StartupSummary
    where
        I: MetadataInspector,
        L: ModuleLoader,
    {
        let roots = self.discovery_roots();
        let pipeline = DiscoveryPipeline::new(inspector, loader, self.config.discovery.extension());
        let report = pipeline.discover_with_report(&roots);

        let skipped = report.skipped.len();
        let unreadable = report.unreadable.len();
        let failed = report.failed.len();
        let missing_roots = report.missing_roots;
        let registered = ordering::register(report.sets, sink);
        info!(
            "早期启动完成: 注册 {} 个插件 (跳过 {}，不可读 {}，加载失败 {})",
            registered, skipped, unreadable, failed
        );
        StartupSummary {
            registered,
            missing_roots,
            skipped,
            unreadable,
            failed,
        }
    }

    /// 启用：环境检测 → 必要时安装 → 自部署。
    ///
    /// 安装失败不影响自部署。
    pub async fn on_enable(&self) -> EnableSummary {
        let runtime = self.ensure_runtime(Installer::new(&self.layout, &self.config)).await;
        let deploy = match deploy::deploy_self(&self.layout, &self.config) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!("自部署失败: {err:#}");
                None
            }
        };
        EnableSummary { runtime, deploy }
    }

    /// 检测运行时，未安装时使用给定安装器安装。
    pub async fn ensure_runtime(&self, installer: Installer<'_>) -> RuntimeStatus {
        let expected = &self.config.runtime.expected_version;
        let marker = match self.layout.marker_file(&self.config) {
            Ok(marker) => marker,
            Err(err) => {
                error!("版本标记文件配置无效: {err:#}");
                return RuntimeStatus::Failed(format!("{err:#}"));
            }
        };

        let state = environment::check(&marker, expected);
        if state.is_satisfied() {
            info!("{} {} 已安装", self.config.runtime.name, expected);
            return RuntimeStatus::AlreadyInstalled;
        }
        info!(
            "{} 需要安装: 当前版本 {:?}，期望版本 {}",
            self.config.runtime.name, state.installed_version, expected
        );

        match installer.ensure_installed().await {
            Ok(outcome) => RuntimeStatus::Installed {
                source: outcome.source,
            },
            Err(err) => {
                error!("{} 安装失败，下次启用时重试: {err}", self.config.runtime.name);
                RuntimeStatus::Failed(err.to_string())
            }
        }
    }
}
