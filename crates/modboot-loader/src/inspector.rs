//! 二进制元数据检查（不加载模块）。
//!
//! 说明：
//! - 仅解析目标文件格式（PE/ELF/Mach-O）的导出表，查找一致性标记符号
//! - 不执行模块中的任何代码；无法解析的文件由调用方视为“跳过”
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::Path;

use modboot_core::contract::CONFORMANCE_SYMBOL;
use modboot_core::error::MetadataReadError;
use object::{BinaryFormat, Object};

/// 元数据检查能力。
pub trait MetadataInspector {
    /// 判断模块是否声明符合插件契约。
    ///
    /// 返回值：
    /// - `Ok(true)`：导出表中存在一致性标记
    /// - `Ok(false)`：元数据中没有标记
    ///
    /// 异常处理：
    /// - 文件无法打开或无法解析为二进制模块时返回 [`MetadataReadError`]
    fn inspect(&self, path: &Path) -> Result<bool, MetadataReadError>;
}

impl<T: MetadataInspector + ?Sized> MetadataInspector for &T {
    fn inspect(&self, path: &Path) -> Result<bool, MetadataReadError> {
        (**self).inspect(path)
    }
}

/// 基于导出表的检查实现。
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportTableInspector;

impl MetadataInspector for ExportTableInspector {
    fn inspect(&self, path: &Path) -> Result<bool, MetadataReadError> {
        let read_error = |reason: String| MetadataReadError {
            path: path.to_path_buf(),
            reason,
        };

        let data = std::fs::read(path).map_err(|e| read_error(e.to_string()))?;
        let file = object::File::parse(&*data).map_err(|e| read_error(e.to_string()))?;

        let format = file.format();
        let exports = file.exports().map_err(|e| read_error(e.to_string()))?;
        Ok(exports
            .iter()
            .any(|export| is_conformance_symbol(format, export.name())))
    }
}

/// 只有 Mach-O 的导出名带前导下划线。
fn is_conformance_symbol(format: BinaryFormat, name: &[u8]) -> bool {
    let name = match format {
        BinaryFormat::MachO => match name.strip_prefix(b"_") {
            Some(stripped) => stripped,
            None => return false,
        },
        _ => name,
    };
    name == CONFORMANCE_SYMBOL.as_bytes()
}
