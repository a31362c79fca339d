//! 注册顺序：将全部模块的插件实例展平并施加确定性全序，再交给宿主注册。
//!
//! 排序键：`(priority 升序, 来源模块路径, 模块内位置)`。
//! 结果只取决于实例集合本身，与目录枚举顺序无关；同一模块内优先级相同的实例保持入口返回顺序。
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::Path;

use tracing::info;

use crate::loader::{LoadedPlugin, LoadedPluginSet};

/// 宿主注册接口（不透明接收端）。
pub trait RegistrationSink {
    /// 按给定顺序注册插件实例，所有权随之转移给宿主。
    fn register_sorted(&mut self, plugins: Vec<LoadedPlugin>);
}

/// 展平并排序。
pub fn order(sets: Vec<LoadedPluginSet>) -> Vec<LoadedPlugin> {
    let mut plugins: Vec<LoadedPlugin> = sets.into_iter().flat_map(|set| set.plugins).collect();
    plugins.sort_by(|a, b| registration_key(a).cmp(&registration_key(b)));
    plugins
}

/// 排序后交给宿主注册，返回注册数量。
pub fn register(sets: Vec<LoadedPluginSet>, sink: &mut dyn RegistrationSink) -> usize {
    let plugins = order(sets);
    let count = plugins.len();
    for plugin in &plugins {
        info!(
            "注册插件: {} {} (priority={}) <- {}",
            plugin.info.name,
            plugin.info.version,
            plugin.info.priority,
            plugin.source.display()
        );
    }
    sink.register_sorted(plugins);
    count
}

fn registration_key(plugin: &LoadedPlugin) -> (i32, &Path, usize) {
    (plugin.info.priority, plugin.source.as_path(), plugin.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modboot_core::contract::{ModPlugin, PluginInfo};

    struct Declared(PluginInfo);

    impl ModPlugin for Declared {
        fn info(&self) -> PluginInfo {
            self.0.clone()
        }
    }

    fn set(path: &str, plugins: &[(&str, i32)]) -> LoadedPluginSet {
        let instances = plugins
            .iter()
            .map(|(name, priority)| {
                Box::new(Declared(PluginInfo::new(*name, "1.0.0", "t").with_priority(*priority)))
                    as Box<dyn ModPlugin>
            })
            .collect();
        LoadedPluginSet::from_instances(Path::new(path), instances)
    }

    fn names(plugins: &[LoadedPlugin]) -> Vec<String> {
        plugins.iter().map(|p| p.info.name.clone()).collect()
    }

    #[test]
    fn priority_then_module_path() {
        let ordered = order(vec![
            set("/m/b.so", &[("zeta", 0), ("alpha", 10)]),
            set("/m/a.so", &[("beta", 0), ("core", -1)]),
        ]);
        assert_eq!(names(&ordered), vec!["core", "beta", "zeta", "alpha"]);
    }

    #[test]
    fn order_is_independent_of_enumeration_order() {
        let forward = order(vec![
            set("/m/a.so", &[("x", 1), ("y", 0)]),
            set("/m/b.so", &[("x", 1)]),
            set("/m/c.so", &[("w", 2)]),
        ]);
        let backward = order(vec![
            set("/m/c.so", &[("w", 2)]),
            set("/m/b.so", &[("x", 1)]),
            set("/m/a.so", &[("x", 1), ("y", 0)]),
        ]);
        let key = |plugins: &[LoadedPlugin]| {
            plugins
                .iter()
                .map(|p| (p.info.name.clone(), p.source.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&forward), key(&backward));
        assert_eq!(names(&forward), vec!["y", "x", "x", "w"]);
        assert_eq!(forward[1].source, Path::new("/m/a.so"));
    }

    #[test]
    fn identical_declarations_keep_module_order() {
        let ordered = order(vec![set("/m/a.so", &[("dup", 0), ("dup", 0)])]);
        assert_eq!(ordered[0].position, 0);
        assert_eq!(ordered[1].position, 1);
    }

    #[test]
    fn equal_priority_keeps_entry_order_within_module() {
        let ordered = order(vec![set("/m/a.so", &[("zeta", 0), ("alpha", 0)])]);
        assert_eq!(names(&ordered), vec!["zeta", "alpha"]);
    }

    #[test]
    fn priority_reorders_within_module() {
        let ordered = order(vec![set("/m/a.so", &[("zeta", 0), ("alpha", 0), ("core", -1)])]);
        assert_eq!(names(&ordered), vec!["core", "zeta", "alpha"]);
    }

    struct Collect(Vec<String>);

    impl RegistrationSink for Collect {
        fn register_sorted(&mut self, plugins: Vec<LoadedPlugin>) {
            self.0.extend(plugins.into_iter().map(|p| p.instance.info().name));
        }
    }

    #[test]
    fn register_hands_ordered_instances_to_sink() {
        let mut sink = Collect(Vec::new());
        let count = register(
            vec![set("/m/a.so", &[("late", 5)]), set("/m/b.so", &[("early", 1)])],
            &mut sink,
        );
        assert_eq!(count, 2);
        assert_eq!(sink.0, vec!["early", "late"]);
    }
}
