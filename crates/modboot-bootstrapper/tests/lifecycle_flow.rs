use std::path::{Path, PathBuf};

use modboot_bootstrapper::deploy::DeployOutcome;
use modboot_bootstrapper::installer::Installer;
use modboot_bootstrapper::lifecycle::{Bootstrap, RuntimeStatus};
use modboot_core::config::BootstrapConfig;
use modboot_core::contract::{ModPlugin, PluginInfo};
use modboot_core::error::{LoadError, MetadataReadError};
use modboot_core::paths::HostLayout;
use modboot_core::platform::PlatformTarget;
use modboot_loader::inspector::MetadataInspector;
use modboot_loader::loader::{LoadedPlugin, LoadedPluginSet, ModuleLoader};
use modboot_loader::ordering::RegistrationSink;
use uuid::Uuid;

// 测试用模块文件：第一行 `marker` 表示符合契约，之后每行 `<name> <priority>`。

struct TextInspector;

impl MetadataInspector for TextInspector {
    fn inspect(&self, path: &Path) -> Result<bool, MetadataReadError> {
        let content = std::fs::read_to_string(path).map_err(|e| MetadataReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(content.starts_with("marker"))
    }
}

struct Declared(PluginInfo);

impl ModPlugin for Declared {
    fn info(&self) -> PluginInfo {
        self.0.clone()
    }
}

struct TextLoader;

impl ModuleLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<LoadedPluginSet, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let instances = content
            .lines()
            .skip(1)
            .map(|line| {
                let (name, priority) = line.split_once(' ').expect("name priority");
                Box::new(Declared(
                    PluginInfo::new(name, "1.0.0", "tester").with_priority(priority.parse().unwrap()),
                )) as Box<dyn ModPlugin>
            })
            .collect();
        Ok(LoadedPluginSet::from_instances(path, instances))
    }
}

#[derive(Default)]
struct Collect(Vec<LoadedPlugin>);

impl RegistrationSink for Collect {
    fn register_sorted(&mut self, plugins: Vec<LoadedPlugin>) {
        self.0.extend(plugins);
    }
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent"))
        .unwrap_or_else(|e| panic!("create parent for {} failed: {e}", path.display()));
    std::fs::write(path, content).unwrap_or_else(|e| panic!("write {} failed: {e}", path.display()));
}

fn bootstrap(root: &Path) -> Bootstrap {
    let mut config = BootstrapConfig::default();
    config.discovery.module_extension = Some("dll".to_string());
    Bootstrap::new(
        HostLayout::new(
            root.join("steamapps").join("common").join("Game"),
            root.join("mod"),
        ),
        config,
    )
}

#[test]
fn discovery_roots_follow_host_layout() {
    let root = PathBuf::from("/library/steamapps/common/Game");
    let layout = HostLayout::new(&root, "/library/mod");
    let boot = Bootstrap::new(layout, BootstrapConfig::default());

    assert_eq!(
        boot.discovery_roots(),
        vec![
            PathBuf::from("/library/steamapps/workshop/content/3167020"),
            root.join("Duckov_Data").join("Mods"),
        ]
    );
}

#[test]
fn shallow_base_dir_skips_shared_root() {
    let boot = Bootstrap::new(HostLayout::new("/", "/mod"), BootstrapConfig::default());
    assert_eq!(boot.discovery_roots(), vec![PathBuf::from("/Duckov_Data/Mods")]);
}

#[test]
fn early_start_registers_shared_and_local_plugins_in_order() {
    let root = unique_temp_dir("modboot-lifecycle-early");
    let _cleanup = CleanupDir(root.clone());
    let boot = bootstrap(&root);

    let shared = root.join("steamapps").join("workshop").join("content").join("3167020");
    let mods = boot.layout.base_dir.join("Duckov_Data").join("Mods");
    write_file(&shared.join("111").join("Workshop.dll"), "marker\nWorkshop 5\n");
    write_file(&mods.join("local").join("Local.dll"), "marker\nLocal 1\nCore -10\n");
    write_file(&mods.join("Helper.dll"), "plain\n");

    let mut sink = Collect::default();
    let summary = boot.early_start_with(TextInspector, TextLoader, &mut sink);

    assert_eq!(summary.registered, 3);
    assert_eq!(summary.skipped, 1);
    assert!(summary.missing_roots.is_empty());
    let names: Vec<&str> = sink.0.iter().map(|p| p.info.name.as_str()).collect();
    assert_eq!(names, vec!["Core", "Local", "Workshop"]);
}

#[test]
fn early_start_with_missing_shared_root_uses_local_mods() {
    let root = unique_temp_dir("modboot-lifecycle-missing");
    let _cleanup = CleanupDir(root.clone());
    let boot = bootstrap(&root);

    let mods = boot.layout.base_dir.join("Duckov_Data").join("Mods");
    write_file(&mods.join("a").join("A.dll"), "marker\nA 0\n");
    write_file(&mods.join("b").join("B.dll"), "marker\nB 0\n");
    write_file(&mods.join("c").join("C.dll"), "plain\nC 0\n");

    let mut sink = Collect::default();
    let summary = boot.early_start_with(TextInspector, TextLoader, &mut sink);

    assert_eq!(
        summary.missing_roots,
        vec![root.join("steamapps").join("workshop").join("content").join("3167020")]
    );
    assert_eq!(summary.registered, 2);
    let names: Vec<&str> = sink.0.iter().map(|p| p.info.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn ensure_runtime_skips_installer_when_marker_matches() {
    let root = unique_temp_dir("modboot-lifecycle-installed");
    let _cleanup = CleanupDir(root.clone());
    let boot = bootstrap(&root);
    write_file(&boot.layout.base_dir.join("version.dll"), "0.7.1.0\n");

    let installer =
        Installer::with_platform(&boot.layout, &boot.config, PlatformTarget::Unknown);
    assert_eq!(boot.ensure_runtime(installer).await, RuntimeStatus::AlreadyInstalled);
}

#[tokio::test]
async fn ensure_runtime_reports_install_failure() {
    let root = unique_temp_dir("modboot-lifecycle-unsupported");
    let _cleanup = CleanupDir(root.clone());
    let boot = bootstrap(&root);
    write_file(&boot.layout.base_dir.join("version.dll"), "0.6.0.0\n");

    let installer =
        Installer::with_platform(&boot.layout, &boot.config, PlatformTarget::Unknown);
    let status = boot.ensure_runtime(installer).await;
    assert!(matches!(status, RuntimeStatus::Failed(_)), "status: {status:?}");
    assert_eq!(
        std::fs::read_to_string(boot.layout.base_dir.join("version.dll")).expect("marker"),
        "0.6.0.0\n"
    );
}

#[tokio::test]
async fn on_enable_deploys_even_without_runtime() {
    let root = unique_temp_dir("modboot-lifecycle-enable");
    let _cleanup = CleanupDir(root.clone());
    let mut boot = bootstrap(&root);
    boot.config.runtime.release_base_url = "http://127.0.0.1:9/unreachable".to_string();
    boot.config.network.use_system_proxy = false;
    boot.config.network.connect_timeout_secs = 2;
    boot.config.network.download_timeout_secs = 5;
    write_file(&boot.layout.mod_dir.join("Bootstrap.dll"), "bootstrap module");

    let summary = boot.on_enable().await;

    assert!(
        matches!(summary.runtime, RuntimeStatus::Failed(_)),
        "runtime: {:?}",
        summary.runtime
    );
    assert_eq!(
        summary.deploy,
        Some(DeployOutcome::Copied(
            boot.layout.base_dir.join("Plugins").join("Bootstrap.dll")
        ))
    );
}

struct CleanupDir(PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
