//! 平台识别与运行时安装包描述表。
//!
//! 说明：
//! - 平台在进程内只识别一次（编译期目标平台），生命周期内不可变
//! - 每个受支持平台对应一条安装包描述；`Unknown` 没有描述，安装流程应直接放弃
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::RuntimeRelease;

/// 运行平台。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformTarget {
    Windows,
    MacOs,
    Linux,
    Unknown,
}

impl PlatformTarget {
    /// 当前进程所在平台。
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Unknown
        }
    }

    /// 安装包文件名中的平台后缀。
    fn package_suffix(self) -> Option<&'static str> {
        match self {
            Self::Windows => Some("x64.zip"),
            Self::MacOs => Some("macOS.x64.zip"),
            Self::Linux => Some("Linux.x64.zip"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// 单个平台的运行时安装包描述。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPackageDescriptor {
    pub platform: PlatformTarget,
    /// 安装包文件名（随附时位于模组目录，下载时也落在此处）。
    pub package_file_name: String,
    /// 发布下载地址。
    pub download_url: String,
}

impl InstallPackageDescriptor {
    /// 查询指定平台的安装包描述。
    ///
    /// 参数：
    /// - `platform`：目标平台
    /// - `release`：运行时发布信息（名称/版本/下载地址前缀）
    ///
    /// 返回值：
    /// - 受支持平台：`<name>.<suffix>` 文件名与 `<base>/v<release>/<file>` 下载地址
    /// - `Unknown`：`None`
    pub fn for_platform(platform: PlatformTarget, release: &RuntimeRelease) -> Option<Self> {
        let suffix = platform.package_suffix()?;
        let package_file_name = format!("{}.{}", release.name, suffix);
        let download_url = format!(
            "{}/v{}/{}",
            release.release_base_url.trim_end_matches('/'),
            release.release,
            package_file_name
        );
        Some(Self {
            platform,
            package_file_name,
            download_url,
        })
    }
}
