//! 示例模组模块：通过 `declare_plugins!` 导出一致性标记与入口，
//! 供加载器在真实动态库上验证两阶段门控。
//!
//! 设置环境变量 `MODBOOT_SAMPLE_PANIC` 后，入口在构造插件时 panic。
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use modboot_core::contract::{ModPlugin, PluginInfo};

/// 触发构造失败的环境变量。
pub const PANIC_ENV: &str = "MODBOOT_SAMPLE_PANIC";

pub struct Zeta;

impl ModPlugin for Zeta {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("Zeta", "1.0.0", "modboot")
    }
}

pub struct Alpha;

impl Alpha {
    fn new() -> Self {
        if std::env::var_os(PANIC_ENV).is_some() {
            panic!("sample plugin refused to start");
        }
        Alpha
    }
}

impl ModPlugin for Alpha {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("Alpha", "1.0.0", "modboot")
    }
}

pub struct Core;

impl ModPlugin for Core {
    fn info(&self) -> PluginInfo {
        PluginInfo::new("Core", "2.0.0", "modboot").with_priority(-1)
    }
}

modboot_core::declare_plugins!(Zeta, Alpha::new(), Core);
