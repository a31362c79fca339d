//! 错误分类。
//!
//! 传播策略：
//! - 发现流程中的错误（目录缺失/元数据读取/模块加载）均在单项边界被捕获并记录日志，不会中断整体流程
//! - 安装流程中的错误（平台不支持/获取失败/解包失败）在流程边界被捕获，下次启用事件重新检测
//! - 任何错误都不会终止宿主进程
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PlatformTarget;

/// 扫描根目录不存在（非致命，跳过该根目录）。
#[derive(Debug, Error)]
#[error("目录不存在: {}", path.display())]
pub struct DirectoryNotFound {
    pub path: PathBuf,
}

/// 模块文件无法打开或无法解析为二进制模块（非致命，跳过该候选）。
#[derive(Debug, Error)]
#[error("读取模块元数据失败: {}: {reason}", path.display())]
pub struct MetadataReadError {
    pub path: PathBuf,
    pub reason: String,
}

/// 模块加载或实例化失败（非致命，该模块贡献零个实例）。
#[derive(Debug, Error)]
#[error("加载模块失败: {}: {reason}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    pub reason: String,
}

/// 运行时安装流程错误（仅对安装流程致命）。
#[derive(Debug, Error)]
pub enum InstallError {
    /// 当前平台没有安装包描述。
    #[error("不支持的平台: {0}")]
    UnsupportedPlatform(PlatformTarget),
    /// 网络请求失败或 HTTP 状态异常。
    #[error("获取安装包失败: {url}: {reason}")]
    Acquisition { url: String, reason: String },
    /// 安装包无法解包到宿主目录。
    #[error("解包失败: {}: {reason}", package.display())]
    Unpack { package: PathBuf, reason: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
