//! 文件发现：递归遍历输入目录，按通配模式区分「合并」与「忽略」。
//!
//! 模式是 shell 风格通配符（`*` 与 `?`），匹配完整路径文本。
//! 核心管线不做任何文件系统遍历，只消费这里给出的路径列表。

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("通配模式 \"{pattern}\" 无法编译: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("遍历目录失败: {source}")]
    Walk {
        #[source]
        source: walkdir::Error,
    },
}

/// 一次发现的结果：命中与忽略分开返回，忽略列表用于运行摘要。
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub found: Vec<PathBuf>,
    pub ignored: Vec<PathBuf>,
}

pub struct FileLocator {
    search: Vec<Regex>,
    ignore: Vec<Regex>,
}

impl FileLocator {
    pub fn new(search: &[String], ignore: &[String]) -> Result<Self, DiscoveryError> {
        Ok(Self {
            search: compile_patterns(search)?,
            ignore: compile_patterns(ignore)?,
        })
    }

    /// 扫描全部输入。目录递归展开，条目按文件名排序保证顺序确定；
    /// 不存在的输入仅记录告警。
    pub fn scan(&self, inputs: &[PathBuf]) -> Result<DiscoveryReport, DiscoveryError> {
        let mut report = DiscoveryReport::default();
        for input in inputs {
            if input.is_dir() {
                for entry in WalkDir::new(input).sort_by_file_name() {
                    let entry = entry.map_err(|source| DiscoveryError::Walk { source })?;
                    if entry.file_type().is_file() {
                        self.classify(entry.path(), &mut report);
                    }
                }
            } else if input.is_file() {
                self.classify(input, &mut report);
            } else {
                warn!(path = %input.display(), "输入路径不存在，已跳过");
            }
        }
        Ok(report)
    }

    fn classify(&self, path: &Path, report: &mut DiscoveryReport) {
        let text = path.to_string_lossy();
        if matches_any(&self.search, &text) && !matches_any(&self.ignore, &text) {
            report.found.push(path.to_path_buf());
        } else {
            report.ignored.push(path.to_path_buf());
        }
    }
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(text))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, DiscoveryError> {
    patterns
        .iter()
        .map(|pattern| {
            wildcard_to_regex(pattern).map_err(|source| DiscoveryError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// 把 shell 通配符翻译成锚定的正则：`*` → `.*`，`?` → `.`。
fn wildcard_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn locator(search: &[&str], ignore: &[&str]) -> FileLocator {
        let search: Vec<String> = search.iter().map(|s| s.to_string()).collect();
        let ignore: Vec<String> = ignore.iter().map(|s| s.to_string()).collect();
        FileLocator::new(&search, &ignore).expect("模式编译失败")
    }

    #[test]
    fn wildcard_translation_matches_like_fnmatch() {
        let regex = wildcard_to_regex("*.dxf").unwrap();
        assert!(regex.is_match("/tmp/in/box.dxf"));
        assert!(!regex.is_match("/tmp/in/box.dxf.bak"));

        let regex = wildcard_to_regex("*_ignore_*").unwrap();
        assert!(regex.is_match("/tmp/in/part_ignore_v2.dxf"));
        assert!(!regex.is_match("/tmp/in/part.dxf"));

        let regex = wildcard_to_regex("part?.dxf").unwrap();
        assert!(regex.is_match("part1.dxf"));
        assert!(!regex.is_match("part10.dxf"));
    }

    #[test]
    fn scan_splits_found_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.dxf"), "").unwrap();
        fs::write(dir.path().join("b_ignore_me.dxf"), "").unwrap();
        fs::write(dir.path().join("readme.txt"), "").unwrap();
        fs::write(nested.join("c.dxf"), "").unwrap();

        let report = locator(&["*.dxf"], &["*_ignore_*"])
            .scan(&[dir.path().to_path_buf()])
            .expect("扫描失败");

        let found: Vec<_> = report
            .found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, ["a.dxf", "c.dxf"]);
        assert_eq!(report.ignored.len(), 2);
    }

    #[test]
    fn single_file_input_is_classified_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.dxf");
        fs::write(&file, "").unwrap();

        let report = locator(&["*.dxf"], &[]).scan(&[file.clone()]).expect("扫描失败");
        assert_eq!(report.found, [file]);
        assert!(report.ignored.is_empty());
    }

    #[test]
    fn missing_input_is_skipped() {
        let report = locator(&["*.dxf"], &[])
            .scan(&[PathBuf::from("/no/such/dir")])
            .expect("扫描失败");
        assert!(report.found.is_empty());
        assert!(report.ignored.is_empty());
    }
}
