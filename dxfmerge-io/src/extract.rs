//! 从 OpenSCAD 导出的 DXF 文本中按固定行偏移提取 LINE 记录。
//!
//! OpenSCAD 导出的 LINE 实体布局是固定的：`LINE` 标记行之后，
//! 第 4、6、8、10 行依次是起点 X、起点 Y、终点 X、终点 Y 的值行。
//! 扫描器据此用「状态 + 偏移计数」读取坐标，而不解读每条记录自身的
//! 组码。这是对生成工具布局的结构性假设：换一种 DXF 方言
//! （或出现名为 `LINE` 的值行）时需要整体替换本模块。

use std::path::Path;

use dxfmerge_core::document::Segment;
use dxfmerge_core::geometry::Point2;

use crate::IoError;

/// 标记行之后读入坐标的偏移（含标记行自身计为 1）。
const OFFSET_START_X: u32 = 5;
const OFFSET_START_Y: u32 = 7;
const OFFSET_END_X: u32 = 9;
const OFFSET_END_Y: u32 = 11;
/// 偏移到达该值时一条记录完整结束。
const OFFSET_TERMINAL: u32 = 13;

const BLOCK_MARKER: &str = "LINE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    InBlock { offset: u32 },
}

/// 一条记录的四个原始坐标槽位。与生成工具一致，缺省值为 "0"。
#[derive(Debug, Clone)]
struct PendingBlock {
    start_x: String,
    start_y: String,
    end_x: String,
    end_y: String,
}

impl Default for PendingBlock {
    fn default() -> Self {
        Self {
            start_x: "0".to_string(),
            start_y: "0".to_string(),
            end_x: "0".to_string(),
            end_y: "0".to_string(),
        }
    }
}

impl PendingBlock {
    /// 数值转换推迟到记录完整、线段真正被消费的时刻。
    fn into_segment(self) -> Result<Segment, ScanError> {
        let sx = parse_coord(&self.start_x, "起点 X")?;
        let sy = parse_coord(&self.start_y, "起点 Y")?;
        let ex = parse_coord(&self.end_x, "终点 X")?;
        let ey = parse_coord(&self.end_y, "终点 Y")?;
        Ok(Segment::new(Point2::new(sx, sy), Point2::new(ex, ey)))
    }
}

fn parse_coord(raw: &str, context: &'static str) -> Result<f64, ScanError> {
    raw.trim().parse::<f64>().map_err(|_| ScanError {
        raw: raw.to_string(),
        context,
    })
}

/// 坐标文本无法解析。在 facade 边界补上文件路径后对外暴露。
#[derive(Debug)]
pub struct ScanError {
    pub raw: String,
    pub context: &'static str,
}

impl ScanError {
    pub fn into_io_error(self, path: &Path) -> IoError {
        IoError::Parse {
            path: path.to_path_buf(),
            raw: self.raw,
            context: self.context,
        }
    }
}

/// 面向单个文件的线段扫描器：惰性、有限、不可重放。
pub struct RecordScanner<'a> {
    lines: std::str::Lines<'a>,
    state: ScanState,
    block: PendingBlock,
}

impl<'a> RecordScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            state: ScanState::Idle,
            block: PendingBlock::default(),
        }
    }

    /// 取下一条完整的线段记录；输入耗尽返回 `Ok(None)`。
    pub fn next_segment(&mut self) -> Result<Option<Segment>, ScanError> {
        while let Some(line) = self.lines.next() {
            let line = line.trim_end_matches('\r');

            // 标记行无条件开启新块，即使上一块尚未读完。
            if line == BLOCK_MARKER {
                self.state = ScanState::InBlock { offset: 1 };
                self.block = PendingBlock::default();
            }

            if let ScanState::InBlock { offset } = &mut self.state {
                match *offset {
                    OFFSET_START_X => self.block.start_x = line.to_string(),
                    OFFSET_START_Y => self.block.start_y = line.to_string(),
                    OFFSET_END_X => self.block.end_x = line.to_string(),
                    OFFSET_END_Y => self.block.end_y = line.to_string(),
                    _ => {}
                }
                *offset += 1;

                if *offset == OFFSET_TERMINAL {
                    self.state = ScanState::Idle;
                    let block = std::mem::take(&mut self.block);
                    return block.into_segment().map(Some);
                }
            }
        }
        Ok(None)
    }

    /// 输入耗尽时块是否尚未读完。未读完的块不产出线段，
    /// 由调用方决定是否记录告警。
    pub fn in_unfinished_block(&self) -> bool {
        matches!(self.state, ScanState::InBlock { .. })
    }
}

/// 读取整个文件并提取全部线段，错误携带文件路径。
pub fn extract_segments(path: &Path) -> Result<(Vec<Segment>, bool), IoError> {
    let text = crate::read_source(path)?;
    let mut scanner = RecordScanner::new(&text);
    let mut segments = Vec::new();
    loop {
        match scanner.next_segment() {
            Ok(Some(segment)) => segments.push(segment),
            Ok(None) => break,
            Err(err) => return Err(err.into_io_error(path)),
        }
    }
    Ok((segments, scanner.in_unfinished_block()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 以生成工具的固定布局拼出一条 LINE 记录的文本。
    fn line_block(sx: &str, sy: &str, ex: &str, ey: &str) -> String {
        format!("LINE\n8\n0\n10\n{sx}\n20\n{sy}\n11\n{ex}\n21\n{ey}\n0\n")
    }

    #[test]
    fn single_block_yields_one_segment() {
        let text = line_block("0.0", "0.0", "1.5", "2.5");
        let mut scanner = RecordScanner::new(&text);

        let segment = scanner
            .next_segment()
            .expect("扫描失败")
            .expect("应产出一条线段");
        assert_eq!(segment.start, Point2::new(0.0, 0.0));
        assert_eq!(segment.end, Point2::new(1.5, 2.5));
        assert!(scanner.next_segment().expect("扫描失败").is_none());
        assert!(!scanner.in_unfinished_block());
    }

    #[test]
    fn consecutive_blocks_yield_segments_in_order() {
        let mut text = line_block("0", "0", "1", "0");
        text.push_str(&line_block("1", "0", "2", "0"));
        let mut scanner = RecordScanner::new(&text);

        let first = scanner.next_segment().unwrap().unwrap();
        let second = scanner.next_segment().unwrap().unwrap();
        assert_eq!(first.end, second.start);
        assert!(scanner.next_segment().unwrap().is_none());
    }

    #[test]
    fn truncated_block_is_dropped() {
        // 终点 Y 之后文件即结束，未达到终止偏移
        let text = "LINE\n8\n0\n10\n0.0\n20\n0.0\n11\n1.0\n21\n1.0";
        let mut scanner = RecordScanner::new(text);

        assert!(scanner.next_segment().unwrap().is_none());
        assert!(scanner.in_unfinished_block());
    }

    #[test]
    fn non_numeric_coordinate_reports_raw_value() {
        let text = line_block("abc", "0", "1", "0");
        let mut scanner = RecordScanner::new(&text);

        let err = scanner.next_segment().expect_err("应报解析错误");
        assert_eq!(err.raw, "abc");
        assert_eq!(err.context, "起点 X");
    }

    #[test]
    fn marker_inside_block_restarts_the_block() {
        // 块内再次出现标记行时整块重来，前一块不产出线段
        let mut text = "LINE\n8\n0\n10\n9.9\n".to_string();
        text.push_str(&line_block("0", "0", "1", "1"));
        let mut scanner = RecordScanner::new(&text);

        let segment = scanner.next_segment().unwrap().unwrap();
        assert_eq!(segment.start, Point2::new(0.0, 0.0));
        assert!(scanner.next_segment().unwrap().is_none());
    }

    #[test]
    fn lines_with_crlf_endings_are_accepted() {
        let text = line_block("0.0", "0.0", "1.0", "0.0").replace('\n', "\r\n");
        let mut scanner = RecordScanner::new(&text);

        let segment = scanner.next_segment().expect("扫描失败").unwrap();
        assert_eq!(segment.end, Point2::new(1.0, 0.0));
    }

    #[test]
    fn unrelated_entities_are_ignored() {
        let mut text = "0\nSECTION\n2\nENTITIES\n0\nCIRCLE\n8\n0\n10\n3.0\n20\n3.0\n40\n1.0\n".to_string();
        text.push_str(&line_block("0", "0", "1", "0"));
        text.push_str("0\nENDSEC\n0\nEOF\n");
        let mut scanner = RecordScanner::new(&text);

        let segment = scanner.next_segment().unwrap().unwrap();
        assert_eq!(segment.start, Point2::new(0.0, 0.0));
        assert!(scanner.next_segment().unwrap().is_none());
    }
}
