//! 模组模块发现与加载能力封装。
//!
//! 目标：
//! - 两阶段门控：先以轻量方式读取模块导出表判断是否符合插件契约，再对符合者执行真正的动态加载
//! - 发现流程对单个模块的失败具备韧性（跳过并记录日志，不中断整体扫描）
//! - 对全部插件实例施加确定性的注册顺序，与文件系统枚举顺序无关
//!
//! 安全注意：
//! - 动态加载会在进程内执行模块初始化代码，且加载后不可撤销（库句柄在进程生命周期内常驻）
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod discovery;
pub mod inspector;
pub mod loader;
pub mod ordering;
