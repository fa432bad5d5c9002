use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod extract;
pub mod sink;

pub use extract::RecordScanner;
pub use sink::{DrawingSaver, DxfSink};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("读取文件 {path:?} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("文件 {path:?} 中 {context} 的值 \"{raw}\" 无法解析为数值")]
    Parse {
        path: PathBuf,
        raw: String,
        context: &'static str,
    },
    #[error("写入文件 {path:?} 失败: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// 读取一个输入文件的全部文本，失败时带上路径信息。
pub fn read_source(path: &Path) -> Result<String, IoError> {
    std::fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}
