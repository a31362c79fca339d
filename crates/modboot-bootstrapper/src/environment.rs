//! 运行时环境检测：版本标记文件是否存在且版本与期望一致。
//!
//! 版本读取规则：
//! - 标记文件是 PE 映像：读取版本资源中 `VS_FIXEDFILEINFO` 的文件版本（`a.b.c.d`）
//! - 其他情况：取文本第一行非空内容
//!
//! 每次检测都重新读取磁盘；读取失败一律视为“未安装”，由安装流程重新安装。
//!
//! 作者：模组引导项目组
//! 创建时间：2026-10-19
//! 修改时间：2026-10-19

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use modboot_core::state::RuntimeEnvironmentState;
use object::pe::{self, ImageNtHeaders32, ImageNtHeaders64, ImageResourceDataEntry};
use object::read::pe::{
    ImageNtHeaders, PeFile, ResourceDirectory, ResourceDirectoryEntryData,
    ResourceDirectoryTable, ResourceNameOrId,
};
use object::{FileKind, LittleEndian as LE};
use tracing::warn;

/// `VS_FIXEDFILEINFO.dwSignature`。
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// 读取当前环境状态。
///
/// 参数：
/// - `marker`：版本标记文件路径
/// - `expected`：期望版本字符串
///
/// 返回值：
/// - 标记缺失或读取失败时 `installed_version` 为 `None`
pub fn check(marker: &Path, expected: &str) -> RuntimeEnvironmentState {
    let installed_version = if marker.is_file() {
        match read_marker_version(marker) {
            Ok(version) => Some(version),
            Err(err) => {
                warn!("版本标记文件不可读，视为未安装: {err:#}");
                None
            }
        }
    } else {
        None
    };
    RuntimeEnvironmentState {
        installed_version,
        expected_version: expected.to_string(),
    }
}

/// 期望版本是否已安装（精确匹配）。
pub fn is_installed(marker: &Path, expected: &str) -> bool {
    check(marker, expected).is_satisfied()
}

/// 读取版本标记文件中的版本字符串。
///
/// 异常处理：
/// - 文件读取失败、PE 中缺少版本资源、文本内容为空时返回错误
pub fn read_marker_version(path: &Path) -> Result<String> {
    let data =
        std::fs::read(path).with_context(|| format!("读取版本标记失败: {}", path.display()))?;
    match FileKind::parse(&*data) {
        Ok(FileKind::Pe32) => pe_file_version::<ImageNtHeaders32>(&data),
        Ok(FileKind::Pe64) => pe_file_version::<ImageNtHeaders64>(&data),
        _ => text_version(&data),
    }
}

fn text_version(data: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(data).context("版本标记既不是 PE 也不是 UTF-8 文本")?;
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("版本标记为空"))
}

fn pe_file_version<Pe: ImageNtHeaders>(data: &[u8]) -> Result<String> {
    let file: PeFile<'_, Pe> = PeFile::parse(data).context("解析 PE 失败")?;
    let sections = file.section_table();
    let rsrc = file
        .data_directories()
        .resource_directory(data, &sections)
        .context("读取资源目录失败")?
        .ok_or_else(|| anyhow!("PE 中没有资源目录"))?;

    let root = rsrc.root().context("读取资源根目录失败")?;
    for entry in root.entries {
        if !matches!(entry.name_or_id(), ResourceNameOrId::Id(id) if id == pe::RT_VERSION) {
            continue;
        }
        let Some(table) = entry.data(rsrc)?.table() else {
            continue;
        };
        let Some(leaf) = first_leaf(rsrc, table)? else {
            continue;
        };
        let size = leaf.size.get(LE) as usize;
        let bytes = sections
            .pe_data_at(data, leaf.offset_to_data.get(LE))
            .ok_or_else(|| anyhow!("版本资源数据越界"))?;
        let bytes = bytes.get(..size).unwrap_or(bytes);
        return fixed_file_version(bytes).ok_or_else(|| anyhow!("版本资源中缺少 VS_FIXEDFILEINFO"));
    }
    Err(anyhow!("PE 中没有版本资源"))
}

/// 沿名称/语言层级找到第一条数据项。
fn first_leaf<'data>(
    rsrc: ResourceDirectory<'data>,
    table: ResourceDirectoryTable<'data>,
) -> Result<Option<&'data ImageResourceDataEntry>> {
    for entry in table.entries {
        match entry.data(rsrc)? {
            ResourceDirectoryEntryData::Data(leaf) => return Ok(Some(leaf)),
            ResourceDirectoryEntryData::Table(child) => {
                if let Some(leaf) = first_leaf(rsrc, child)? {
                    return Ok(Some(leaf));
                }
            }
        }
    }
    Ok(None)
}

/// 在 `VS_VERSIONINFO` 数据中定位 `VS_FIXEDFILEINFO` 并格式化文件版本。
fn fixed_file_version(bytes: &[u8]) -> Option<String> {
    let signature = FIXED_FILE_INFO_SIGNATURE.to_le_bytes();
    let start = bytes.windows(4).position(|w| w == signature)?;
    let read_u32 = |offset: usize| -> Option<u32> {
        let raw = bytes.get(start + offset..start + offset + 4)?;
        Some(u32::from_le_bytes(raw.try_into().ok()?))
    };
    let ms = read_u32(8)?;
    let ls = read_u32(12)?;
    Some(format!(
        "{}.{}.{}.{}",
        ms >> 16,
        ms & 0xFFFF,
        ls >> 16,
        ls & 0xFFFF
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_info(major: u16, minor: u16, build: u16, revision: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; 6];
        bytes.extend_from_slice(&FIXED_FILE_INFO_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        bytes.extend_from_slice(&((u32::from(major) << 16) | u32::from(minor)).to_le_bytes());
        bytes.extend_from_slice(&((u32::from(build) << 16) | u32::from(revision)).to_le_bytes());
        bytes.extend_from_slice(&[0u8; 36]);
        bytes
    }

    #[test]
    fn fixed_file_info_is_formatted_as_four_parts() {
        assert_eq!(fixed_file_version(&fixed_info(0, 7, 1, 0)).as_deref(), Some("0.7.1.0"));
        assert_eq!(
            fixed_file_version(&fixed_info(10, 0, 19041, 1)).as_deref(),
            Some("10.0.19041.1")
        );
    }

    #[test]
    fn truncated_fixed_file_info_is_rejected() {
        let mut bytes = fixed_info(0, 7, 1, 0);
        bytes.truncate(14);
        assert_eq!(fixed_file_version(&bytes), None);
    }

    #[test]
    fn text_marker_uses_first_non_empty_line() {
        assert_eq!(text_version(b"\n  0.7.1.0  \r\nextra").unwrap(), "0.7.1.0");
        assert!(text_version(b"  \n\n").is_err());
        assert!(text_version(&[0xff, 0xfe, 0x00]).is_err());
    }
}
