//! 模块加载：将符合契约的模块加载进进程并取出其声明的插件实例。
//!
//! 约束：
//! - 仅在一致性检查返回 `true` 后调用
//! - 加载是单向操作：库句柄被常驻保留，进程生命周期内不会卸载或重复加载
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use modboot_core::contract::{panic_message, ModPlugin, PluginEntryFn, PluginInfo, ENTRY_SYMBOL};
use modboot_core::error::LoadError;

/// 已加载的插件实例（不透明句柄 + 加载时读取的身份信息）。
pub struct LoadedPlugin {
    pub instance: Box<dyn ModPlugin>,
    pub info: PluginInfo,
    /// 来源模块路径。
    pub source: PathBuf,
    /// 在来源模块入口返回序列中的位置。
    pub position: usize,
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("info", &self.info)
            .field("source", &self.source)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// 单个模块加载得到的插件实例序列（保持入口返回的顺序）。
#[derive(Debug)]
pub struct LoadedPluginSet {
    pub source: PathBuf,
    pub plugins: Vec<LoadedPlugin>,
}

impl LoadedPluginSet {
    /// 由入口返回的实例构造集合，并读取每个实例的身份信息。
    pub fn from_instances(source: &Path, instances: Vec<Box<dyn ModPlugin>>) -> Self {
        let plugins = instances
            .into_iter()
            .enumerate()
            .map(|(position, instance)| LoadedPlugin {
                info: instance.info(),
                instance,
                source: source.to_path_buf(),
                position,
            })
            .collect();
        Self {
            source: source.to_path_buf(),
            plugins,
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// 模块加载能力。
pub trait ModuleLoader {
    /// 加载模块并枚举其声明的插件实例。
    ///
    /// 异常处理：
    /// - 加载/实例化过程中的任何失败返回 [`LoadError`]，调用方记录日志后跳过该模块
    fn load(&self, path: &Path) -> Result<LoadedPluginSet, LoadError>;
}

impl<T: ModuleLoader + ?Sized> ModuleLoader for &T {
    fn load(&self, path: &Path) -> Result<LoadedPluginSet, LoadError> {
        (**self).load(path)
    }
}

/// 基于动态库（.dll/.so/.dylib）的加载实现。
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeModuleLoader;

impl ModuleLoader for NativeModuleLoader {
    fn load(&self, path: &Path) -> Result<LoadedPluginSet, LoadError> {
        let load_error = |reason: String| LoadError {
            path: path.to_path_buf(),
            reason,
        };

        // SAFETY: 打开动态库会执行其初始化代码；模块已通过一致性检查，视为可信的模组模块。
        let library = unsafe { Library::new(path) }.map_err(|e| load_error(e.to_string()))?;
        // 初始化代码已经运行，无论后续是否成功都不再卸载。
        let library: &'static Library = Box::leak(Box::new(library));

        // SAFETY: 符合契约的模块以 `PluginEntryFn` 的签名导出入口符号。
        let entry: Symbol<'static, PluginEntryFn> = unsafe { library.get(ENTRY_SYMBOL.as_bytes()) }
            .map_err(|e| load_error(format!("缺少入口符号 '{ENTRY_SYMBOL}': {e}")))?;

        // 模块内的 panic 由入口自行捕获并以 `Err` 返回；这里只兜住同一运行时内的展开。
        let collected = panic::catch_unwind(AssertUnwindSafe(|| {
            // SAFETY: 见上，入口签名由契约约定。
            unsafe { entry() }
        }))
        .map_err(|payload| {
            load_error(format!("模块初始化时发生 panic: {}", panic_message(&*payload)))
        })?;
        let instances =
            collected.map_err(|reason| load_error(format!("模块初始化时发生 panic: {reason}")))?;
        Ok(LoadedPluginSet::from_instances(path, instances))
    }
}
