pub mod errors {
    use thiserror::Error;

    use dxfmerge_io::IoError;

    #[derive(Debug, Error)]
    pub enum MergeError {
        #[error(transparent)]
        Io(#[from] IoError),
    }
}

pub mod layers {
    //! 图层名与颜色的分配。
    //!
    //! 多图层模式下每个源文件得到一个以文件名命名的图层，重名时追加
    //! `_1`、`_2` 直至唯一；单图层模式下全部文件共用 `layer0`。
    //! 颜色默认只取调色板首项（与生成工具的既有行为一致），真正的
    //! 轮转分配放在 [`ColorCycling::RoundRobin`] 开关之后。

    use std::path::Path;

    /// 单图层模式下共用的固定图层名。
    pub const SHARED_LAYER_NAME: &str = "layer0";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LayerMode {
        /// 每个源文件一个图层。
        PerFile,
        /// 所有文件合并进同一个图层。
        Single,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ColorCycling {
        /// 既有行为：所有图层都使用调色板的第一项。
        FirstOnly,
        /// 每个文件向后轮转一项，耗尽后回绕。显式开启才生效。
        RoundRobin,
    }

    /// 本次运行内分配出的图层名保证互不重复。
    #[derive(Debug)]
    pub struct LayerAllocator {
        mode: LayerMode,
        cycling: ColorCycling,
        palette: Vec<u8>,
        used_names: Vec<String>,
        cursor: usize,
    }

    impl LayerAllocator {
        pub fn new(mode: LayerMode, cycling: ColorCycling, palette: Vec<u8>) -> Self {
            Self {
                mode,
                cycling,
                palette,
                used_names: Vec::new(),
                cursor: 0,
            }
        }

        /// 为一个源文件分配 (图层名, 颜色)。
        pub fn allocate(&mut self, source: &Path) -> (String, u8) {
            let name = match self.mode {
                LayerMode::Single => SHARED_LAYER_NAME.to_string(),
                LayerMode::PerFile => {
                    let base = source
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| SHARED_LAYER_NAME.to_string());
                    let mut candidate = base.clone();
                    let mut suffix = 1;
                    while self.used_names.iter().any(|used| used == &candidate) {
                        candidate = format!("{base}_{suffix}");
                        suffix += 1;
                    }
                    self.used_names.push(candidate.clone());
                    candidate
                }
            };
            (name, self.next_color())
        }

        fn next_color(&mut self) -> u8 {
            if self.palette.is_empty() {
                return 0;
            }
            match self.cycling {
                ColorCycling::FirstOnly => self.palette[0],
                ColorCycling::RoundRobin => {
                    let color = self.palette[self.cursor % self.palette.len()];
                    self.cursor += 1;
                    color
                }
            }
        }
    }

}

pub mod merge {
    //! 顺序执行的合并管线：逐个文件提取、拼接、分配图层，
    //! 全部累积进唯一的 [`Drawing`] 后交由调用方一次性写出。

    use std::path::{Path, PathBuf};

    use tracing::{debug, info, warn};

    use dxfmerge_core::assemble::PolylineAssembler;
    use dxfmerge_core::document::{Drawing, Polyline};
    use dxfmerge_io::extract::extract_segments;

    use crate::errors::MergeError;
    use crate::layers::{ColorCycling, LayerAllocator, LayerMode};

    /// 一次运行的全部可配置项。构造后不可变，显式传入每个步骤。
    #[derive(Debug, Clone)]
    pub struct MergeOptions {
        pub layer_mode: LayerMode,
        pub color_cycling: ColorCycling,
        pub palette: Vec<u8>,
        /// 连续性判定的容差。`None` 表示精确比较（既有行为）。
        pub continuity_tolerance: Option<f64>,
    }

    impl Default for MergeOptions {
        fn default() -> Self {
            Self {
                layer_mode: LayerMode::PerFile,
                color_cycling: ColorCycling::FirstOnly,
                palette: vec![0],
                continuity_tolerance: None,
            }
        }
    }

    /// 累积输出文档。`Drawing` 在整个运行期间由它独占持有。
    #[derive(Debug, Default)]
    pub struct DocumentBuilder {
        drawing: Drawing,
    }

    impl DocumentBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// 记录一个文件的产出。没有路径的文件同样注册图层，
        /// 以便在输出中看到空图层。
        pub fn add_file(&mut self, layer_name: &str, color: u8, polylines: Vec<Polyline>) {
            let layer = self.drawing.ensure_layer(layer_name, color);
            for polyline in polylines {
                layer.push_polyline(polyline);
            }
        }

        pub fn finish(self) -> Drawing {
            self.drawing
        }
    }

    /// 提取并拼接单个文件的全部路径。对文件内容而言是纯函数。
    pub fn extract_polylines(
        path: &Path,
        tolerance: Option<f64>,
    ) -> Result<Vec<Polyline>, MergeError> {
        let (segments, truncated) = extract_segments(path)?;
        let mut assembler = match tolerance {
            Some(tolerance) => PolylineAssembler::with_tolerance(tolerance),
            None => PolylineAssembler::new(),
        };

        let segment_count = segments.len();
        for segment in segments {
            assembler.push(segment);
        }
        if truncated {
            // 不完整的尾部记录按既有行为丢弃，只留下日志痕迹
            warn!(path = %path.display(), "文件末尾存在未读完的 LINE 记录，已丢弃");
        }

        let polylines = assembler.finish();
        debug!(
            path = %path.display(),
            segment_count,
            polyline_count = polylines.len(),
            "文件提取完成"
        );
        Ok(polylines)
    }

    /// 按给定顺序合并所有文件，返回待写出的文档。
    /// 任何一个文件出错即整体失败，不产生部分输出。
    pub fn merge_files(files: &[PathBuf], options: &MergeOptions) -> Result<Drawing, MergeError> {
        let mut allocator = LayerAllocator::new(
            options.layer_mode,
            options.color_cycling,
            options.palette.clone(),
        );
        let mut builder = DocumentBuilder::new();

        for path in files {
            let polylines = extract_polylines(path, options.continuity_tolerance)?;
            let (layer_name, color) = allocator.allocate(path);
            info!(
                path = %path.display(),
                layer = %layer_name,
                polyline_count = polylines.len(),
                "合并文件"
            );
            builder.add_file(&layer_name, color, polylines);
        }

        Ok(builder.finish())
    }
}
