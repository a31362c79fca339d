//! 插件运行时安装：确定平台 → 获取安装包（随附或下载）→ 解包到宿主基础目录。
//!
//! 状态约束：
//! - 获取阶段只写模组目录（下载先写 `<file>.part`，成功后再改名），不触碰宿主基础目录
//! - 解包是唯一修改宿主基础目录的步骤，且只在确认安装包可用后执行
//! - 下载内容必须能作为 zip 打开才会改名为安装包，否则删除，下次启用重新下载
//! - 解包时版本标记文件最后写出，中途失败不会留下“版本匹配”的假象
//! - 解包后重新读取版本标记，与期望版本不一致视为解包失败
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::fs::File;
use std::path::{Path, PathBuf};

use modboot_core::config::BootstrapConfig;
use modboot_core::error::InstallError;
use modboot_core::paths::HostLayout;
use modboot_core::platform::{InstallPackageDescriptor, PlatformTarget};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::environment;

/// 安装包来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSource {
    /// 模组目录中已随附。
    Bundled,
    /// 本次从发布地址下载。
    Downloaded,
}

/// 一次成功安装的结果。
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub package: PathBuf,
    pub source: PackageSource,
    /// 解包写出的文件数量。
    pub files: usize,
}

/// 运行时安装器。
#[derive(Debug)]
pub struct Installer<'a> {
    layout: &'a HostLayout,
    config: &'a BootstrapConfig,
    platform: PlatformTarget,
}

impl<'a> Installer<'a> {
    pub fn new(layout: &'a HostLayout, config: &'a BootstrapConfig) -> Self {
        Self::with_platform(layout, config, PlatformTarget::current())
    }

    pub fn with_platform(
        layout: &'a HostLayout,
        config: &'a BootstrapConfig,
        platform: PlatformTarget,
    ) -> Self {
        Self {
            layout,
            config,
            platform,
        }
    }

    /// 确保运行时安装到宿主基础目录（仅在环境检测失败后调用）。
    ///
    /// 返回值：
    /// - 成功：安装包位置、来源与解包文件数量
    ///
    /// 异常处理：
    /// - 平台不支持：返回 [`InstallError::UnsupportedPlatform`]，不做任何写入
    /// - 下载失败/HTTP 状态异常：返回 [`InstallError::Acquisition`]，宿主目录保持不变
    /// - 下载内容不是有效 zip：返回 [`InstallError::Acquisition`]，不保留下载文件
    /// - 安装包损坏或解包后版本标记与期望不符：返回 [`InstallError::Unpack`]
    pub async fn ensure_installed(&self) -> Result<InstallOutcome, InstallError> {
        let descriptor =
            InstallPackageDescriptor::for_platform(self.platform, &self.config.runtime)
                .ok_or(InstallError::UnsupportedPlatform(self.platform))?;

        let package = self.layout.bundled_package(&descriptor.package_file_name);
        let source = if package.is_file() {
            info!("使用随附安装包: {}", package.display());
            PackageSource::Bundled
        } else {
            info!(
                "{} 不在模组目录中，开始下载: {}",
                descriptor.package_file_name, descriptor.download_url
            );
            self.download(&descriptor.download_url, &package).await?;
            PackageSource::Downloaded
        };

        let marker = PathBuf::from(&self.config.runtime.marker_file);
        let base_dir = self.layout.base_dir.clone();
        let archive = package.clone();
        let files = tokio::task::spawn_blocking(move || unpack(&archive, &base_dir, &marker))
            .await
            .map_err(|e| InstallError::Unpack {
                package: package.clone(),
                reason: e.to_string(),
            })??;

        let expected = &self.config.runtime.expected_version;
        let marker = self.layout.base_dir.join(&self.config.runtime.marker_file);
        let state = environment::check(&marker, expected);
        if !state.is_satisfied() {
            return Err(InstallError::Unpack {
                package,
                reason: format!(
                    "安装包中的版本标记为 {}，期望 {}",
                    state.installed_version.as_deref().unwrap_or("缺失"),
                    expected
                ),
            });
        }

        info!(
            "运行时已解包到 {} ({} 个文件)",
            self.layout.base_dir.display(),
            files
        );
        Ok(InstallOutcome {
            package,
            source,
            files,
        })
    }

    /// 流式下载到 `<dest>.part`，完成后改名为 `dest`。
    async fn download(&self, url: &str, dest: &Path) -> Result<(), InstallError> {
        let network = &self.config.network;
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("modboot/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(network.connect_timeout())
            .timeout(network.download_timeout());
        if !network.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| acquisition_error(url, e))?;

        let mut response = client
            .get(url)
            .header("Accept", "application/octet-stream")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| acquisition_error(url, e))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallError::io(format!("创建目录失败: {}", parent.display()), e))?;
        }
        let partial = partial_path(dest);
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| InstallError::io(format!("创建文件失败: {}", partial.display()), e))?;

        let mut written: u64 = 0;
        let copied: Result<(), InstallError> = async {
            while let Some(chunk) = response.chunk().await.map_err(|e| acquisition_error(url, e))? {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| InstallError::io(format!("写入失败: {}", partial.display()), e))?;
                written += chunk.len() as u64;
            }
            file.flush()
                .await
                .map_err(|e| InstallError::io(format!("写入失败: {}", partial.display()), e))
        }
        .await;
        drop(file);

        if let Err(err) = copied {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(err);
        }

        let checked = partial.clone();
        let verified = tokio::task::spawn_blocking(move || verify_archive(&checked))
            .await
            .map_err(|e| e.to_string())
            .and_then(|result| result);
        if let Err(reason) = verified {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(acquisition_error(url, format!("下载内容不是有效的安装包: {reason}")));
        }

        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|e| InstallError::io(format!("重命名失败: {}", partial.display()), e))?;
        info!("下载完成: {} ({} 字节)", dest.display(), written);
        Ok(())
    }
}

fn acquisition_error(url: &str, err: impl std::fmt::Display) -> InstallError {
    InstallError::Acquisition {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

/// 确认文件可以作为 zip 打开（中央目录完整）。
fn verify_archive(path: &Path) -> Result<(), String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    zip::ZipArchive::new(file).map(|_| ()).map_err(|e| e.to_string())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// 将安装包解包到目标目录（覆盖已有文件），返回写出的文件数量。
///
/// 参数：
/// - `package`：zip 安装包
/// - `dest`：宿主基础目录
/// - `marker`：版本标记文件（相对 `dest`），最后写出
///
/// 异常处理：
/// - 安装包无法打开/不是有效 zip：在写入任何文件前返回错误
/// - 写文件失败返回错误
pub fn unpack(package: &Path, dest: &Path, marker: &Path) -> Result<usize, InstallError> {
    let unpack_error = |reason: String| InstallError::Unpack {
        package: package.to_path_buf(),
        reason,
    };

    let file = File::open(package).map_err(|e| unpack_error(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| unpack_error(e.to_string()))?;

    let mut order: Vec<usize> = Vec::with_capacity(archive.len());
    let mut deferred = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| unpack_error(e.to_string()))?;
        if entry.enclosed_name().as_deref() == Some(marker) {
            deferred.push(index);
        } else {
            order.push(index);
        }
    }
    order.extend(deferred);

    let mut files = 0;
    for index in order {
        let mut entry = archive.by_index(index).map_err(|e| unpack_error(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("跳过不安全的压缩包条目: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|e| InstallError::io(format!("创建目录失败: {}", target.display()), e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| InstallError::io(format!("创建目录失败: {}", parent.display()), e))?;
        }
        let mut out = File::create(&target)
            .map_err(|e| InstallError::io(format!("写入文件失败: {}", target.display()), e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| unpack_error(e.to_string()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode));
        }
        files += 1;
    }
    Ok(files)
}
