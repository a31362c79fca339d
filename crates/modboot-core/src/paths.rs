//! 宿主目录布局约定。
//!
//! 目标：
//! - 将落盘/扫描路径集中管理，避免散落在各流程中
//! - 统一基础目录、插件目录、版本标记文件、模组根目录的推导规则
//!
//! 目录结构（默认）：
//! - `<steamapps>/common/<game>`：宿主基础目录（版本标记文件、`Plugins` 目录）
//! - `<steamapps>/workshop/content/<app_id>`：创意工坊共享内容目录
//! - `<base>/Duckov_Data/Mods`：本地模组目录
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::config::BootstrapConfig;

/// 宿主目录布局。
///
/// 字段说明：
/// - `base_dir`：宿主基础目录（由宿主提供）
/// - `mod_dir`：引导程序自身所在目录（随附安装包、引导模块源文件所在位置）
#[derive(Debug, Clone)]
pub struct HostLayout {
    pub base_dir: PathBuf,
    pub mod_dir: PathBuf,
}

impl HostLayout {
    pub fn new(base_dir: impl Into<PathBuf>, mod_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            mod_dir: mod_dir.into(),
        }
    }

    /// 版本标记文件路径：`<base>/<marker_file>`。
    pub fn marker_file(&self, config: &BootstrapConfig) -> Result<PathBuf> {
        resolve_path(&self.base_dir, &config.runtime.marker_file)
    }

    /// 宿主插件目录：`<base>/Plugins`。
    pub fn plugins_dir(&self, config: &BootstrapConfig) -> Result<PathBuf> {
        resolve_path(&self.base_dir, &config.deploy.plugins_dir)
    }

    /// 引导模块源文件：`<mod_dir>/<self_module>`。
    pub fn self_module_source(&self, config: &BootstrapConfig) -> Result<PathBuf> {
        resolve_path(&self.mod_dir, &config.deploy.self_module)
    }

    /// 引导模块部署目标：`<base>/Plugins/<self_module>`。
    pub fn self_module_destination(&self, config: &BootstrapConfig) -> Result<PathBuf> {
        let name = Path::new(&config.deploy.self_module)
            .file_name()
            .ok_or_else(|| anyhow!("引导模块文件名无效: {}", config.deploy.self_module))?;
        Ok(self.plugins_dir(config)?.join(name))
    }

    /// 随附安装包路径：`<mod_dir>/<file_name>`。
    pub fn bundled_package(&self, file_name: &str) -> PathBuf {
        self.mod_dir.join(file_name)
    }

    /// 本地模组根目录。
    pub fn mods_root(&self, config: &BootstrapConfig) -> Result<PathBuf> {
        resolve_path(&self.base_dir, &config.discovery.mods_dir)
    }

    /// 创意工坊共享内容根目录。
    ///
    /// 返回值：
    /// - 配置了 `shared_content_dir`：直接使用（相对路径以基础目录为基准）
    /// - 否则：`<base>/../../workshop/content/<app_id>`
    /// - 基础目录层级不足以推导 steamapps 目录时返回 `None`
    pub fn shared_content_root(&self, config: &BootstrapConfig) -> Option<PathBuf> {
        if let Some(explicit) = config.discovery.shared_content_dir.as_deref() {
            return resolve_path(&self.base_dir, explicit).ok();
        }
        let steam_apps = self.base_dir.parent()?.parent()?;
        Some(
            steam_apps
                .join("workshop")
                .join("content")
                .join(&config.discovery.workshop_app_id),
        )
    }
}

/// 确保目录存在（不存在则递归创建）。
///
/// 异常处理：
/// - 目录创建失败（权限、路径非法等）会返回错误。
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("创建目录失败: {}", path.display()))?;
    Ok(())
}

/// 将配置中的路径字段解析为实际路径。
///
/// 参数：
/// - `base`：相对路径的基准目录
/// - `raw`：配置中的路径字符串
///
/// 返回值：
/// - `raw` 为绝对路径：直接返回
/// - `raw` 为相对路径：返回 `base.join(raw)`
///
/// 异常处理：
/// - `raw` 为空字符串时返回错误，避免误用导致写入基准目录本身。
pub fn resolve_path(base: &Path, raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(anyhow!("空路径"));
    }
    let p = PathBuf::from(raw);
    if p.is_absolute() {
        Ok(p)
    } else {
        Ok(base.join(p))
    }
}
