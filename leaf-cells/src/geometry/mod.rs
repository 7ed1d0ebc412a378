//! 细胞截图的几何变换.
//!
//! 正向: 原图 -> 裁剪 (膨胀后区域的包围盒) -> 四周填充 `p` -> 最近邻放大 `s` 倍 -> 逆时针旋转直角.
//! 逆向: 截图上的相对坐标 (原点在截图中心, 取值 `[-0.5, 0.5]²`) -> 原图像素坐标.
//!
//! # 注意
//!
//! 1. 坐标一律为 `(y, x)`, 即 (行, 列), y 轴向下.
//! 2. 相对坐标与放大倍数无关, 因此记录中只保存填充后 (未放大) 的尺寸.
//! 3. 旋转只允许 0, 90, 180, 270 度. 任意角度会改变包围盒大小, 无法再用偏移量和尺寸还原.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Point2d;

mod chain;

pub use chain::{extract_crop, CropSpec, TransformChain};

/// 旋转角度不是直角.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rotation must be one of 0, 90, 180, 270 degrees, got {0}")]
pub struct RotationError(pub i64);

/// 直角旋转.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    /// 不旋转.
    #[default]
    R0,

    /// 90 度.
    R90,

    /// 180 度.
    R180,

    /// 270 度.
    R270,
}

impl TryFrom<i64> for Rotation {
    type Error = RotationError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            _ => Err(RotationError(degrees)),
        }
    }
}

impl From<Rotation> for i64 {
    #[inline]
    fn from(r: Rotation) -> Self {
        r.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

impl Rotation {
    /// 全部四个直角.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// 角度值.
    #[inline]
    pub const fn degrees(self) -> i64 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// 精确的 `(sin, cos)`.
    #[inline]
    const fn sin_cos(self) -> (f64, f64) {
        match self {
            Rotation::R0 => (0.0, 1.0),
            Rotation::R90 => (1.0, 0.0),
            Rotation::R180 => (0.0, -1.0),
            Rotation::R270 => (-1.0, 0.0),
        }
    }

    /// 相反方向的旋转.
    #[inline]
    pub const fn inverse(self) -> Rotation {
        match self {
            Rotation::R0 => Rotation::R0,
            Rotation::R90 => Rotation::R270,
            Rotation::R180 => Rotation::R180,
            Rotation::R270 => Rotation::R90,
        }
    }

    /// 绕原点顺时针旋转 `point`: `(y', x') = (x sin + y cos, x cos - y sin)`.
    ///
    /// 只涉及 0 与 ±1 的乘法, 结果是精确的.
    #[inline]
    pub fn rotate_clockwise(self, (y, x): Point2d) -> Point2d {
        let (sin, cos) = self.sin_cos();
        (x * sin + y * cos, x * cos - y * sin)
    }

    /// 绕原点逆时针旋转 `point`, 即 [`Rotation::rotate_clockwise`] 的逆.
    #[inline]
    pub fn rotate_counter_clockwise(self, point: Point2d) -> Point2d {
        self.inverse().rotate_clockwise(point)
    }
}

/// 绕原点顺时针旋转任意角度 (单位: 度). 公式与 [`Rotation::rotate_clockwise`] 相同,
/// 但使用浮点三角函数, 因此只在误差范围内精确.
pub fn rotate((y, x): Point2d, degrees: f64) -> Point2d {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * sin + y * cos, x * cos - y * sin)
}

/// 把 `[0, 1]²` 中的归一化点击坐标平移为以中心为原点的相对坐标.
#[inline]
pub fn fraction_to_relative((fy, fx): Point2d) -> Point2d {
    (fy - 0.5, fx - 0.5)
}

/// 相对坐标 -> 截图内的绝对坐标.
#[inline]
pub fn relative_point_in_region((y, x): Point2d, ydim: usize, xdim: usize) -> Point2d {
    (ydim as f64 * (y + 0.5), xdim as f64 * (x + 0.5))
}

/// 截图内的绝对坐标 -> 原图坐标.
#[inline]
pub fn region_point_in_image((y, x): Point2d, dy_offset: i64, dx_offset: i64) -> Point2d {
    (y + dy_offset as f64, x + dx_offset as f64)
}

/// 四舍六入五成双.
#[inline]
pub fn point_as_int((y, x): Point2d) -> (i64, i64) {
    (y.round_ties_even() as i64, x.round_ties_even() as i64)
}

/// 截图上的相对坐标 -> 原图坐标 (取整前).
pub fn original_image_point_exact(
    relative: Point2d,
    rotation: Rotation,
    ydim: usize,
    xdim: usize,
    dy_offset: i64,
    dx_offset: i64,
) -> Point2d {
    let rotated = rotation.rotate_clockwise(relative);
    let in_region = relative_point_in_region(rotated, ydim, xdim);
    region_point_in_image(in_region, dy_offset, dx_offset)
}

/// 截图上的相对坐标 -> 原图像素坐标.
///
/// 1. 顺时针旋转 `rotation`, 抵消截图的逆时针旋转;
/// 2. 乘以填充后的尺寸 `(ydim, xdim)`;
/// 3. 加上填充后截图左上角在原图中的偏移 (可能为负);
/// 4. 四舍六入五成双.
///
/// # 返回值
///
/// 原图中的 `(y, x)`. 点击落在原图之外时可能为负.
pub fn original_image_point(
    relative: Point2d,
    rotation: Rotation,
    ydim: usize,
    xdim: usize,
    dy_offset: i64,
    dx_offset: i64,
) -> (i64, i64) {
    point_as_int(original_image_point_exact(
        relative, rotation, ydim, xdim, dy_offset, dx_offset,
    ))
}
