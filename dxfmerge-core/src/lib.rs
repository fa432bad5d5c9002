pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，与源文件中的双精度坐标一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        /// 到另一点的欧氏距离，仅在显式开启容差比较时使用。
        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }
}

pub mod document {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 单条直线记录。仅在单个文件的提取与拼接过程中短暂存在，
    /// 不会进入最终文档。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Segment {
        pub start: Point2,
        pub end: Point2,
    }

    impl Segment {
        #[inline]
        pub fn new(start: Point2, end: Point2) -> Self {
            Self { start, end }
        }
    }

    /// 连续路径，至少包含两个顶点；相邻顶点均来自同一条源线段。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        points: Vec<Point2>,
    }

    impl Polyline {
        /// 由顶点序列构造。调用方（拼接器）保证顶点数 ≥ 2。
        pub fn from_points(points: Vec<Point2>) -> Self {
            debug_assert!(points.len() >= 2, "Polyline 至少需要两个顶点");
            Self { points }
        }

        #[inline]
        pub fn points(&self) -> &[Point2] {
            &self.points
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.points.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.points.is_empty()
        }
    }

    /// 图层：运行期内名称唯一，持有分配到的 ACI 颜色索引与路径列表。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub color: u8,
        polylines: Vec<Polyline>,
    }

    impl Layer {
        pub fn new(name: impl Into<String>, color: u8) -> Self {
            Self {
                name: name.into(),
                color,
                polylines: Vec::new(),
            }
        }

        #[inline]
        pub fn push_polyline(&mut self, polyline: Polyline) {
            self.polylines.push(polyline);
        }

        #[inline]
        pub fn polylines(&self) -> &[Polyline] {
            &self.polylines
        }
    }

    /// 输出文档：按注册顺序排列的图层序列。
    /// 每次运行只创建一个实例，由合并引擎独占持有，序列化一次后丢弃。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Drawing {
        layers: Vec<Layer>,
    }

    impl Drawing {
        pub fn new() -> Self {
            Self::default()
        }

        /// 按名称注册图层；重复注册返回已有图层（颜色以首次注册为准）。
        pub fn ensure_layer(&mut self, name: impl AsRef<str>, color: u8) -> &mut Layer {
            let key = name.as_ref();
            if let Some(index) = self.layers.iter().position(|layer| layer.name == key) {
                return &mut self.layers[index];
            }
            self.layers.push(Layer::new(key, color));
            self.layers.last_mut().unwrap()
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.iter()
        }

        #[inline]
        pub fn layer_count(&self) -> usize {
            self.layers.len()
        }

        pub fn polyline_count(&self) -> usize {
            self.layers.iter().map(|layer| layer.polylines().len()).sum()
        }
    }

}

pub mod assemble {
    use crate::document::{Polyline, Segment};
    use crate::geometry::Point2;

    /// 把一个文件内按顺序出现的线段拼成连续路径。
    ///
    /// 相邻两条线段若满足「后一条的起点等于前一条的终点」即视为连续；
    /// 不满足时在此处断开，开启一条新路径。相等判定默认使用解析后的
    /// 数值做精确比较；`with_tolerance` 提供显式的容差开关，属于对
    /// 既有行为的偏离，默认不启用。
    #[derive(Debug, Default)]
    pub struct PolylineAssembler {
        current: Vec<Point2>,
        last_end: Option<Point2>,
        tolerance: Option<f64>,
        finished: Vec<Polyline>,
    }

    impl PolylineAssembler {
        pub fn new() -> Self {
            Self::default()
        }

        /// 开启容差比较：两点距离不超过 `tolerance` 即视为连续。
        pub fn with_tolerance(tolerance: f64) -> Self {
            Self {
                tolerance: Some(tolerance),
                ..Self::default()
            }
        }

        fn touches(&self, previous_end: Point2, next_start: Point2) -> bool {
            match self.tolerance {
                Some(tolerance) => previous_end.distance(next_start) <= tolerance,
                None => previous_end == next_start,
            }
        }

        /// 按源文件顺序送入一条线段。
        /// 退化线段（起点 == 终点）同样参与连续性判定。
        pub fn push(&mut self, segment: Segment) {
            if let Some(last_end) = self.last_end {
                if !self.touches(last_end, segment.start) {
                    let completed = std::mem::take(&mut self.current);
                    self.finished.push(Polyline::from_points(completed));
                }
            }
            // 连续时起点即上一条的终点，只有新的终点延长路径；
            // N 条首尾相接的线段因此产生 N+1 个顶点。
            if self.current.is_empty() {
                self.current.push(segment.start);
            }
            self.current.push(segment.end);
            self.last_end = Some(segment.end);
        }

        /// 输入结束后冲刷未完成的路径，返回全部结果（可能为空）。
        pub fn finish(mut self) -> Vec<Polyline> {
            if !self.current.is_empty() {
                let completed = std::mem::take(&mut self.current);
                self.finished.push(Polyline::from_points(completed));
            }
            self.finished
        }
    }

    /// 一次性拼接整段线段序列的便捷入口。
    pub fn assemble(segments: impl IntoIterator<Item = Segment>) -> Vec<Polyline> {
        let mut assembler = PolylineAssembler::new();
        for segment in segments {
            assembler.push(segment);
        }
        assembler.finish()
    }

}
