use std::path::PathBuf;

use modboot_core::config::BootstrapConfig;
use modboot_core::contract::ModPlugin;
use modboot_core::paths::HostLayout;
use modboot_core::platform::{InstallPackageDescriptor, PlatformTarget};
use uuid::Uuid;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

struct Compass;

impl ModPlugin for Compass {
    fn info(&self) -> modboot_core::contract::PluginInfo {
        modboot_core::contract::PluginInfo::new("Compass", "1.0.0", "tester").with_priority(-5)
    }
}

struct Radar;

impl ModPlugin for Radar {
    fn info(&self) -> modboot_core::contract::PluginInfo {
        modboot_core::contract::PluginInfo::new("Radar", "0.3.0", "tester")
    }
}

modboot_core::declare_plugins!(Compass, Radar);

#[test]
fn load_full_config_file() {
    let dir = unique_temp_dir("modboot-core-config");
    let _cleanup = CleanupDir(dir.clone());

    let path = dir.join("bootstrap.json");
    std::fs::write(
        &path,
        r#"
{
  "runtime": {
    "name": "MelonLoader",
    "release": "0.7.1",
    "expected_version": "0.7.1.0",
    "release_base_url": "https://mirror.example.invalid/releases",
    "marker_file": "version.dll"
  },
  "discovery": {
    "workshop_app_id": "42",
    "shared_content_dir": null,
    "mods_dir": "Game_Data/Mods"
  },
  "deploy": { "plugins_dir": "Plugins", "self_module": "Bootstrap.dll" },
  "network": { "download_timeout_secs": 60, "connect_timeout_secs": 5 }
}
"#,
    )
    .expect("write config");

    let config = BootstrapConfig::load(&path).expect("load config");
    assert_eq!(config.discovery.workshop_app_id, "42");
    assert_eq!(config.network.download_timeout_secs, 60);

    let layout = HostLayout::new(dir.join("steamapps").join("common").join("Game"), &dir);
    assert_eq!(
        layout.mods_root(&config).unwrap(),
        dir.join("steamapps").join("common").join("Game").join("Game_Data").join("Mods")
    );
    assert_eq!(
        layout.shared_content_root(&config).unwrap(),
        dir.join("steamapps").join("workshop").join("content").join("42")
    );

    let linux = InstallPackageDescriptor::for_platform(PlatformTarget::Linux, &config.runtime)
        .expect("linux descriptor");
    assert_eq!(
        linux.download_url,
        "https://mirror.example.invalid/releases/v0.7.1/MelonLoader.Linux.x64.zip"
    );
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let dir = unique_temp_dir("modboot-core-config-missing");
    let _cleanup = CleanupDir(dir.clone());

    let config = BootstrapConfig::load(&dir.join("absent.json")).expect("defaults");
    assert_eq!(config.runtime.expected_version, "0.7.1.0");
    assert_eq!(config.deploy.self_module, "Bootstrap.dll");
}

#[test]
fn malformed_config_is_an_error() {
    let dir = unique_temp_dir("modboot-core-config-bad");
    let _cleanup = CleanupDir(dir.clone());

    let path = dir.join("bootstrap.json");
    std::fs::write(&path, "{ not json").expect("write config");
    assert!(BootstrapConfig::load(&path).is_err());
}

#[test]
fn declared_entry_returns_plugins_in_declaration_order() {
    let plugins = modboot_plugin_entry().expect("entry succeeds");
    let names: Vec<String> = plugins.iter().map(|p| p.info().name).collect();
    assert_eq!(names, vec!["Compass".to_string(), "Radar".to_string()]);
    assert_eq!(plugins[0].info().priority, -5);
    assert_eq!(modboot_plugin_declare, 1);
}

struct CleanupDir(PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
