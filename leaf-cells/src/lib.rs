#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 从叶片表皮的共聚焦 z-stack 中提取表面深度图, 将细胞壁/标记物信号投影到表面上,
//! 用带种子的分水岭算法分割出细胞, 并提供细胞截图坐标与原图像素坐标之间的精确映射.
//!
//! 该 crate 只提供 `safe` 接口, 所有数值操作均为纯函数, 不做任何 I/O
//! ([`io`] 模块除外, 它只是外部数据的薄加载层).
//!
//! # 注意
//!
//! 1. 体数据的坐标为 `(h, w, z)`, 即 (行, 列, 深度). 二维图像的坐标为 `(h, w)`,
//!   几何模块中也称为 `(y, x)`.
//! 2. 违反调用约定 (如空体数据) 时程序直接 panic; 可恢复的错误 (参数缺失、形状不符)
//!   通过 [`LeafError`] 返回.
//!
//! # 开发计划
//!
//! ### 表面提取 ✅
//!
//! 每个 `(h, w)` 列按自身的百分位数作为阈值, 从 z = 0 向下扫描, 第一个超过阈值的深度即为表面.
//!
//! 实现位于 `leaf-cells/src/surface.rs`.
//!
//! ### z 窗口投影 ✅
//!
//! 以表面为基准取 `[z - zabove, z + zbelow]` 窗口求均值或最大值. 窗口退化时扩展为单层.
//! 投影前用三维百分位滤波去噪.
//!
//! 实现位于 `leaf-cells/src/projection`.
//!
//! ### 种子生成 & 分水岭分割 ✅
//!
//! 局部中值自适应阈值 -> 去除小连通域 -> 取反 -> 再次去除小连通域 -> 4-连通标记.
//! 然后以细胞壁亮度为地形高度做分水岭, 最后按外部 mask 整体剔除细胞.
//!
//! 实现位于 `leaf-cells/src/segment`.
//!
//! ### 几何映射 ✅
//!
//! 裁剪 -> 填充 -> 放大 -> 旋转 (仅限直角) 的正向变换, 及其精确逆变换.
//!
//! 实现位于 `leaf-cells/src/geometry`.
//!
//! ### 细胞记录 & 张量 CSV ✅
//!
//! 细胞记录以 JSON 保存, 用户标注后再读回并生成 `id,mx,my,cx,cy` 格式的 CSV.
//!
//! 实现位于 `leaf-cells/src/record.rs` 和 `leaf-cells/src/tensor.rs`.

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(h, w, z)`.
pub type Idx3d = (usize, usize, usize);

/// 高精度二维点 `(y, x)`.
pub type Point2d = (f64, f64);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

mod error;

pub mod config;
pub mod consts;
pub mod data;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod prelude;
pub mod projection;
pub mod record;
pub mod segment;
pub mod surface;
pub mod tensor;

pub use config::{ConfigError, Parameters};
pub use data::{ChannelStack, Mask, Projection, ShapeError, SurfaceMap, Volume, ZStackSource};
pub use error::{LeafError, LeafResult};
pub use geometry::{original_image_point, Rotation, RotationError, TransformChain};
pub use record::CellRecord;
pub use segment::{Region, Segmentation};
