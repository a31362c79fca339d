//! 模组发现流程：遍历根目录 → 元数据检查 → 加载 → 汇总。
//!
//! 行为约定：
//! - 根目录不存在：记录警告，该根目录不贡献任何模块（根目录本身是可选的）
//! - 按文件系统枚举顺序递归遍历，此阶段不排序（注册顺序由 [`crate::ordering`] 负责）
//! - 每个候选模块输出一行诊断日志（跳过/加载成功/加载失败）
//! - 单个模块的失败不会中断遍历
//! - 严格串行：模块加载会修改进程级共享状态，不能并发
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::{Path, PathBuf};

use modboot_core::error::DirectoryNotFound;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::inspector::MetadataInspector;
use crate::loader::{LoadedPluginSet, ModuleLoader};

/// 一次发现过程中的候选模块。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateModule {
    pub path: PathBuf,
}

/// 发现结果与诊断统计。
///
/// 字段说明：
/// - `sets`：成功加载的模块（按遍历顺序）
/// - `missing_roots`：不存在而被跳过的根目录
/// - `skipped`：没有一致性标记的候选
/// - `unreadable`：元数据无法读取的候选
/// - `failed`：加载失败的候选
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub sets: Vec<LoadedPluginSet>,
    pub missing_roots: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub unreadable: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl DiscoveryReport {
    /// 全部已加载插件实例数量。
    pub fn plugin_count(&self) -> usize {
        self.sets.iter().map(LoadedPluginSet::len).sum()
    }
}

/// 发现流程（检查器与加载器通过能力接口注入）。
#[derive(Debug)]
pub struct DiscoveryPipeline<I, L> {
    inspector: I,
    loader: L,
    extension: String,
}

impl<I: MetadataInspector, L: ModuleLoader> DiscoveryPipeline<I, L> {
    /// 创建发现流程。
    ///
    /// 参数：
    /// - `inspector`：元数据检查实现
    /// - `loader`：模块加载实现
    /// - `extension`：模块文件扩展名（不含点，大小写不敏感）
    pub fn new(inspector: I, loader: L, extension: impl Into<String>) -> Self {
        Self {
            inspector,
            loader,
            extension: extension.into(),
        }
    }

    /// 扫描全部根目录并返回成功加载的模块集合。
    pub fn discover(&self, roots: &[PathBuf]) -> Vec<LoadedPluginSet> {
        self.discover_with_report(roots).sets
    }

    /// 扫描全部根目录，同时返回诊断统计。
    pub fn discover_with_report(&self, roots: &[PathBuf]) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for root in roots {
            if !root.is_dir() {
                let err = DirectoryNotFound { path: root.clone() };
                warn!("{err}，跳过该根目录");
                report.missing_roots.push(root.clone());
                continue;
            }
            for candidate in self.candidates(root) {
                self.process(candidate, &mut report);
            }
        }
        info!(
            "模组发现完成: {} 个模块，{} 个插件实例",
            report.sets.len(),
            report.plugin_count()
        );
        report
    }

    /// 递归枚举根目录下扩展名匹配的文件（文件系统枚举顺序）。
    fn candidates(&self, root: &Path) -> Vec<CandidateModule> {
        WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("遍历目录出错，忽略: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
            })
            .map(|entry| CandidateModule {
                path: entry.into_path(),
            })
            .collect()
    }

    fn process(&self, candidate: CandidateModule, report: &mut DiscoveryReport) {
        let file_name = candidate
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.inspector.inspect(&candidate.path) {
            Ok(true) => {}
            Ok(false) => {
                info!("模块 {file_name} 不是符合契约的模组模块，跳过");
                report.skipped.push(candidate.path);
                return;
            }
            Err(err) => {
                warn!("{err}，跳过");
                report.unreadable.push(candidate.path);
                return;
            }
        }

        match self.loader.load(&candidate.path) {
            Ok(set) => {
                info!(
                    "已加载模组模块: {} ({} 个插件)",
                    candidate.path.display(),
                    set.len()
                );
                report.sets.push(set);
            }
            Err(err) => {
                error!("{err}");
                report.failed.push(candidate.path);
            }
        }
    }
}
