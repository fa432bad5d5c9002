//! 输出侧的序列化落点。
//!
//! 合并引擎只依赖 [`DrawingSaver`] 这一接口；具体的 DXF 编码交给
//! `dxf` crate，这里只负责把文档模型映射成图层与 LWPOLYLINE 实体。

use std::path::Path;

use dxfmerge_core::document::Drawing;

use crate::IoError;

pub trait DrawingSaver {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError>;
}

/// 基于 `dxf` crate 的写出实现。整个文档一次性写出。
pub struct DxfSink;

impl DxfSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSaver for DxfSink {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError> {
        let mut output = dxf::Drawing::new();
        // LWPOLYLINE 要求 R2000 及以上的文件版本；默认的 R12 在
        // save_file 时会直接丢弃不支持的实体。
        output.header.version = dxf::enums::AcadVersion::R2000;

        for layer in drawing.layers() {
            let mut dxf_layer = dxf::tables::Layer::default();
            dxf_layer.name = layer.name.clone();
            dxf_layer.color = dxf::Color::from_index(layer.color);
            output.add_layer(dxf_layer);

            for polyline in layer.polylines() {
                let mut lwpolyline = dxf::entities::LwPolyline::default();
                lwpolyline.vertices = polyline
                    .points()
                    .iter()
                    .map(|point| {
                        let mut vertex = dxf::LwPolylineVertex::default();
                        vertex.x = point.x();
                        vertex.y = point.y();
                        vertex
                    })
                    .collect();

                let mut entity =
                    dxf::entities::Entity::new(dxf::entities::EntityType::LwPolyline(lwpolyline));
                entity.common.layer = layer.name.clone();
                output.add_entity(entity);
            }
        }

        output.save_file(path).map_err(|err| IoError::Write {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}
