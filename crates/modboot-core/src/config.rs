//! 引导配置（bootstrap.json）模型定义。
//!
//! 该模块描述引导程序需要的全部可调输入：
//! - 插件运行时发布信息（名称/发布版本/期望文件版本/下载地址前缀/版本标记文件）
//! - 模组发现根目录（创意工坊共享内容、本地 Mods 目录）
//! - 自部署目标（插件目录名、引导模块文件名）
//! - 网络获取超时
//!
//! 约定：
//! - 所有字段通过 `#[serde(default)]` 提供默认值，配置文件缺失或字段缺省时均可工作
//! - 默认值对应宿主游戏的发行布局与运行时 0.7.1 版本
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 默认配置文件名（位于引导程序自身所在的模组目录）。
pub const DEFAULT_CONFIG_FILE: &str = "bootstrap.json";

/// 引导配置根对象（对应 `bootstrap.json`）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// 插件运行时发布信息。
    pub runtime: RuntimeRelease,
    /// 模组发现配置。
    pub discovery: DiscoveryConfig,
    /// 自部署配置。
    pub deploy: DeployConfig,
    /// 网络获取配置。
    pub network: NetworkConfig,
}

impl BootstrapConfig {
    /// 读取并解析引导配置（JSON）。
    ///
    /// 参数：
    /// - `path`：配置文件路径
    ///
    /// 返回值：
    /// - 文件存在：返回解析后的 [`BootstrapConfig`]
    /// - 文件不存在：返回默认配置（配置文件是可选的）
    ///
    /// 异常处理：
    /// - 文件存在但读取失败（权限/IO）返回错误
    /// - JSON 解析失败返回错误
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("未找到配置文件，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("读取配置失败: {}", path.display()))?;
        let config: BootstrapConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("解析配置 JSON 失败: {}", path.display()))?;
        Ok(config)
    }
}

/// 插件运行时发布信息。
///
/// 字段说明：
/// - `name`：运行时名称，同时作为安装包文件名前缀（如 `MelonLoader.x64.zip`）
/// - `release`：发布标签版本（下载地址中的 `v<release>`）
/// - `expected_version`：安装后版本标记文件应携带的版本字符串（精确匹配）
/// - `release_base_url`：发布下载地址前缀
/// - `marker_file`：版本标记文件（相对宿主基础目录）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeRelease {
    pub name: String,
    pub release: String,
    pub expected_version: String,
    pub release_base_url: String,
    pub marker_file: String,
}

impl Default for RuntimeRelease {
    fn default() -> Self {
        Self {
            name: "MelonLoader".to_string(),
            release: "0.7.1".to_string(),
            expected_version: "0.7.1.0".to_string(),
            release_base_url: "https://github.com/LavaGang/MelonLoader/releases/download"
                .to_string(),
            marker_file: "version.dll".to_string(),
        }
    }
}

/// 模组发现配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// 创意工坊应用 ID（共享内容目录为 `<steamapps>/workshop/content/<app_id>`）。
    pub workshop_app_id: String,
    /// 显式指定共享内容目录（覆盖按基础目录推导的路径）。
    pub shared_content_dir: Option<String>,
    /// 本地模组目录（相对宿主基础目录或绝对路径）。
    pub mods_dir: String,
    /// 模块文件扩展名（为空则使用当前平台动态库扩展名）。
    pub module_extension: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            workshop_app_id: "3167020".to_string(),
            shared_content_dir: None,
            mods_dir: "Duckov_Data/Mods".to_string(),
            module_extension: None,
        }
    }
}

impl DiscoveryConfig {
    /// 实际使用的模块扩展名（不含点）。
    pub fn extension(&self) -> &str {
        self.module_extension
            .as_deref()
            .unwrap_or(std::env::consts::DLL_EXTENSION)
    }
}

/// 自部署配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// 宿主插件目录名（相对宿主基础目录）。
    pub plugins_dir: String,
    /// 引导模块文件名（源位于模组目录，目标位于插件目录）。
    pub self_module: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            plugins_dir: "Plugins".to_string(),
            self_module: "Bootstrap.dll".to_string(),
        }
    }
}

/// 网络获取配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// 整体下载超时（秒）。
    pub download_timeout_secs: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout_secs: u64,
    /// 是否使用系统代理（`HTTP_PROXY` 等环境变量）。
    pub use_system_proxy: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: 300,
            connect_timeout_secs: 30,
            use_system_proxy: true,
        }
    }
}

impl NetworkConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
