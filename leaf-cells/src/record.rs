//! 单个细胞的持久化记录.
//!
//! 导出截图时写出, 用户在截图上点击标记物后补充归一化点击坐标, 之后只读.

use serde::{Deserialize, Serialize};

use crate::geometry::{fraction_to_relative, original_image_point, Rotation, TransformChain};
use crate::segment::Region;
use crate::{LeafResult, Point2d};

/// 细胞记录, 以 JSON 形式保存.
///
/// 读取时也接受旧键名 `clicked_y` / `clicked_x`. 新旧键同时出现时以新键为准.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredCellRecord")]
pub struct CellRecord {
    /// 细胞编号, 即分割中的区域编号.
    pub cell_id: u32,

    /// 原图中的质心 `[y, x]`.
    pub centroid: [f64; 2],

    /// 像素个数.
    pub area: usize,

    /// 填充后截图左上角的行偏移.
    pub dy_offset: i64,

    /// 填充后截图左上角的列偏移.
    pub dx_offset: i64,

    /// 填充后截图的高度.
    pub ydim: usize,

    /// 填充后截图的宽度.
    pub xdim: usize,

    /// 截图的旋转角度.
    pub rotation: Rotation,

    /// 用户点击的归一化 y 坐标, 取值 `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalised_marker_y_coord: Option<f64>,

    /// 用户点击的归一化 x 坐标, 取值 `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalised_marker_x_coord: Option<f64>,
}

/// 磁盘上的记录格式, 新旧点击键名分别保存.
#[derive(Deserialize)]
struct StoredCellRecord {
    cell_id: u32,
    centroid: [f64; 2],
    #[serde(default)]
    area: usize,
    dy_offset: i64,
    dx_offset: i64,
    ydim: usize,
    xdim: usize,
    rotation: Rotation,
    #[serde(default)]
    normalised_marker_y_coord: Option<f64>,
    #[serde(default)]
    normalised_marker_x_coord: Option<f64>,
    #[serde(default)]
    clicked_y: Option<f64>,
    #[serde(default)]
    clicked_x: Option<f64>,
}

impl From<StoredCellRecord> for CellRecord {
    fn from(stored: StoredCellRecord) -> Self {
        Self {
            cell_id: stored.cell_id,
            centroid: stored.centroid,
            area: stored.area,
            dy_offset: stored.dy_offset,
            dx_offset: stored.dx_offset,
            ydim: stored.ydim,
            xdim: stored.xdim,
            rotation: stored.rotation,
            normalised_marker_y_coord: stored.normalised_marker_y_coord.or(stored.clicked_y),
            normalised_marker_x_coord: stored.normalised_marker_x_coord.or(stored.clicked_x),
        }
    }
}

impl CellRecord {
    /// 由区域及其截图变换创建, 此时还没有点击坐标.
    pub fn new(region: &Region, chain: &TransformChain) -> Self {
        let (cy, cx) = region.centroid();
        Self {
            cell_id: region.identifier(),
            centroid: [cy, cx],
            area: region.area(),
            dy_offset: chain.dy_offset,
            dx_offset: chain.dx_offset,
            ydim: chain.ydim,
            xdim: chain.xdim,
            rotation: chain.rotation,
            normalised_marker_y_coord: None,
            normalised_marker_x_coord: None,
        }
    }

    /// 补充点击坐标.
    pub fn with_marker(mut self, (fy, fx): Point2d) -> Self {
        self.normalised_marker_y_coord = Some(fy);
        self.normalised_marker_x_coord = Some(fx);
        self
    }

    /// 归一化点击坐标 `(y, x)`. 两个分量都存在时才返回 `Some`.
    #[inline]
    pub fn marker_fraction(&self) -> Option<Point2d> {
        Some((self.normalised_marker_y_coord?, self.normalised_marker_x_coord?))
    }

    /// 质心 `(y, x)`.
    #[inline]
    pub fn centroid(&self) -> Point2d {
        (self.centroid[0], self.centroid[1])
    }

    /// 把点击坐标映射回原图像素, 截图视为按 `rotation` 旋转过.
    pub fn marker_point(&self, rotation: Rotation) -> Option<(i64, i64)> {
        let relative = fraction_to_relative(self.marker_fraction()?);
        Some(original_image_point(
            relative,
            rotation,
            self.ydim,
            self.xdim,
            self.dy_offset,
            self.dx_offset,
        ))
    }

    /// 解析 JSON.
    pub fn from_json(s: &str) -> LeafResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// 序列化为 JSON.
    pub fn to_json(&self) -> LeafResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
