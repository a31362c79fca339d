//! 模组引导核心库（与加载机制/网络无关）。
//!
//! 功能：
//! - 定义引导配置（bootstrap.json）与运行时发布信息
//! - 定义宿主目录布局（基础目录、插件目录、模组目录、共享内容目录）
//! - 定义平台识别与安装包描述表
//! - 定义插件契约（一致性标记符号、入口符号、插件身份信息）
//! - 定义错误分类与运行时环境状态模型
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod config;
pub mod contract;
pub mod error;
pub mod paths;
pub mod platform;
pub mod state;
