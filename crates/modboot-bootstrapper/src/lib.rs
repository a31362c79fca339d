//! 模组引导程序库。
//!
//! 功能：
//! - 运行时环境检测（版本标记文件）
//! - 运行时安装（随附或下载安装包，解包到宿主基础目录）
//! - 自部署（引导模块复制到宿主插件目录）
//! - 宿主生命周期入口（早期启动、启用）
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

pub mod deploy;
pub mod environment;
pub mod installer;
pub mod lifecycle;
