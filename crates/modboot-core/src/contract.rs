//! 插件契约：模组模块需要满足的约定。
//!
//! 一个模块被视为“符合契约”的条件：
//! - 导出表中存在一致性标记符号 [`CONFORMANCE_SYMBOL`]（无参数，存在即代表声明）
//! - 导出入口符号 [`ENTRY_SYMBOL`]，调用后按声明顺序返回插件实例
//!
//! 模块与宿主各自静态链接一份标准库，模块内的 panic 无法跨边界展开，
//! 因此入口在模块内部捕获 panic 并以 `Err` 返回。
//!
//! 模组作者通常直接使用 [`declare_plugins!`](crate::declare_plugins) 同时导出两个符号：
//!
//! ```rust,ignore
//! use modboot_core::contract::{ModPlugin, PluginInfo};
//!
//! struct Minimap;
//!
//! impl ModPlugin for Minimap {
//!     fn info(&self) -> PluginInfo {
//!         PluginInfo::new("Minimap", "1.2.0", "someone")
//!     }
//! }
//!
//! modboot_core::declare_plugins!(Minimap);
//! ```
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

/// 一致性标记符号名（仅检查是否存在，不读取内容）。
pub const CONFORMANCE_SYMBOL: &str = "modboot_plugin_declare";

/// 入口符号名。
pub const ENTRY_SYMBOL: &str = "modboot_plugin_entry";

/// 插件声明的身份信息（由宿主契约暴露，用于确定注册顺序）。
///
/// 字段说明：
/// - `priority`：数值越小越先注册
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    #[serde(default)]
    pub priority: i32,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: author.into(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// 模组插件实例（加载后交由宿主注册，本系统不执行其逻辑）。
pub trait ModPlugin: Send + Sync {
    /// 声明的身份信息。
    fn info(&self) -> PluginInfo;
}

/// 入口函数类型：成功时按声明顺序返回实例，构造失败时返回 panic 信息。
#[allow(improper_ctypes_definitions)]
pub type PluginEntryFn = unsafe extern "C-unwind" fn() -> Result<Vec<Box<dyn ModPlugin>>, String>;

/// 在模块内构造插件实例并捕获 panic（供 [`declare_plugins!`](crate::declare_plugins) 使用）。
pub fn collect_plugins<F>(build: F) -> Result<Vec<Box<dyn ModPlugin>>, String>
where
    F: FnOnce() -> Vec<Box<dyn ModPlugin>>,
{
    panic::catch_unwind(AssertUnwindSafe(build)).map_err(|payload| panic_message(&*payload))
}

/// 提取 panic 负载中的文本。
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知错误".to_string()
    }
}

/// 在模组模块中导出一致性标记与入口符号。
///
/// 参数为若干插件构造表达式，入口按书写顺序返回实例。
#[macro_export]
macro_rules! declare_plugins {
    ($($plugin:expr),* $(,)?) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        #[used]
        pub static modboot_plugin_declare: u8 = 1;

        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C-unwind" fn modboot_plugin_entry() -> ::std::result::Result<
            ::std::vec::Vec<::std::boxed::Box<dyn $crate::contract::ModPlugin>>,
            ::std::string::String,
        > {
            $crate::contract::collect_plugins(|| {
                ::std::vec![$(::std::boxed::Box::new($plugin) as ::std::boxed::Box<dyn $crate::contract::ModPlugin>),*]
            })
        }
    };
}
