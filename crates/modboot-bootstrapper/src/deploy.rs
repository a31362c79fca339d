//! 自部署：将引导模块复制到宿主插件目录，使下次启动时由宿主直接加载。
//!
//! 目标文件已存在时不做任何操作（不比较内容，不覆盖）。
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::PathBuf;

use anyhow::{Context, Result};
use modboot_core::config::BootstrapConfig;
use modboot_core::paths::{self, HostLayout};
use tracing::info;

/// 自部署结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// 插件目录中已存在，未做修改。
    AlreadyPresent(PathBuf),
    /// 本次复制到插件目录。
    Copied(PathBuf),
}

/// 将引导模块复制到 `<base>/Plugins/`（必要时创建目录）。
///
/// 异常处理：
/// - 源文件缺失、目录创建或复制失败时返回错误
pub fn deploy_self(layout: &HostLayout, config: &BootstrapConfig) -> Result<DeployOutcome> {
    let destination = layout.self_module_destination(config)?;
    if destination.exists() {
        info!("引导模块已在插件目录中: {}", destination.display());
        return Ok(DeployOutcome::AlreadyPresent(destination));
    }

    let source = layout.self_module_source(config)?;
    let plugins_dir = layout.plugins_dir(config)?;
    paths::ensure_dir(&plugins_dir)?;
    std::fs::copy(&source, &destination).with_context(|| {
        format!(
            "复制引导模块失败: {} -> {}",
            source.display(),
            destination.display()
        )
    })?;
    info!("引导模块已部署: {}", destination.display());
    Ok(DeployOutcome::Copied(destination))
}
