//! 运行时环境状态模型。
//!
//! 说明：
//! - 每次检测都从磁盘重新读取，不做缓存
//! - 只有已安装版本与期望版本逐字相等时才视为“已安装”
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use serde::{Deserialize, Serialize};

/// 运行时环境状态。
///
/// 字段说明：
/// - `installed_version`：版本标记文件中读取到的版本（标记缺失或不可读时为 `None`）
/// - `expected_version`：配置要求的版本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEnvironmentState {
    pub installed_version: Option<String>,
    pub expected_version: String,
}

impl RuntimeEnvironmentState {
    /// 是否已安装期望版本（精确匹配）。
    pub fn is_satisfied(&self) -> bool {
        self.installed_version.as_deref() == Some(self.expected_version.as_str())
    }
}
