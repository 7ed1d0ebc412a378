//! 共聚焦 z-stack 体数据及其二维派生图像的基础数据结构.

use std::ops::Index;

use ndarray::{Array3, Array4, ArrayD, ArrayView1, ArrayView3, Axis, Ix3};

use crate::{Idx2d, Idx3d};

mod plane;

pub use plane::{Mask, Projection, SurfaceMap};

/// 输入数组的维度或形状与约定不符.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// 维度个数不对, 例如期望三维体数据却拿到二维图像.
    #[error("expected a {expected}-d array, found a {found}-d array")]
    Dimensionality {
        /// 期望的维度个数.
        expected: usize,
        /// 实际的维度个数.
        found: usize,
    },

    /// 某个轴长度为 0.
    #[error("axis {axis} has zero length")]
    EmptyAxis {
        /// 长度为 0 的轴.
        axis: usize,
    },

    /// 二维图像与投影平面大小不一致.
    #[error("frame mismatch: expected {expected:?}, found {found:?}")]
    FrameMismatch {
        /// 期望的 `(h, w)`.
        expected: Idx2d,
        /// 实际的 `(h, w)`.
        found: Idx2d,
    },

    /// 请求的通道不存在.
    #[error("channel {channel} out of range, the stack has {channels} channel(s)")]
    ChannelOutOfRange {
        /// 请求的通道.
        channel: usize,
        /// 总通道数.
        channels: usize,
    },

    /// 表面深度图与体数据的层数不一致.
    #[error("depth mismatch: the volume has {expected} slice(s), the surface was built for {found}")]
    DepthMismatch {
        /// 体数据的层数.
        expected: usize,
        /// 深度图来源的层数.
        found: usize,
    },
}

/// 检查每个轴的长度都非 0.
fn check_non_empty(shape: &[usize]) -> Result<(), ShapeError> {
    match shape.iter().position(|&len| len == 0) {
        Some(axis) => Err(ShapeError::EmptyAxis { axis }),
        None => Ok(()),
    }
}

/// 单通道三维强度体数据, 按 `(h, w, z)` 组织.
///
/// 创建后不可变. 处理某个通道期间由调用者持有.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<u16>,
}

impl Index<Idx3d> for Volume {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl Volume {
    /// 由 `(h, w, z)` 三维数组直接创建. 任一轴为空时返回 `Err`.
    pub fn new(data: Array3<u16>) -> Result<Self, ShapeError> {
        check_non_empty(data.shape())?;
        Ok(Self { data })
    }

    /// 由形状已知合法的数组创建 (如对已有体数据逐体素变换的结果).
    #[inline]
    pub(crate) fn new_unchecked(data: Array3<u16>) -> Self {
        debug_assert!(data.shape().iter().all(|&len| len != 0));
        Self { data }
    }

    /// 由动态维度数组创建. 数组必须恰好是三维的.
    pub fn from_dyn(data: ArrayD<u16>) -> Result<Self, ShapeError> {
        if data.ndim() != 3 {
            return Err(ShapeError::Dimensionality {
                expected: 3,
                found: data.ndim(),
            });
        }
        // 上面已检查维度, 这里不会失败.
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| ShapeError::Dimensionality {
                expected: 3,
                found: 0,
            })?;
        Self::new(data)
    }

    /// 数据形状 `(h, w, z)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 水平平面 (投影平面) 的形状 `(h, w)`.
    #[inline]
    pub fn frame_shape(&self) -> Idx2d {
        let (h, w, _) = self.shape();
        (h, w)
    }

    /// z 方向的层数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().2
    }

    /// 获取 `(h, w)` 处沿 z 方向的整列强度.
    ///
    /// 越界时 panic.
    #[inline]
    pub fn column(&self, (h, w): Idx2d) -> ArrayView1<'_, u16> {
        self.data.slice(ndarray::s![h, w, ..])
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u16> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<u16> {
        self.data
    }
}

/// 按通道提供 z-stack 的数据源.
///
/// 显微镜文件的解析与通道拆分由外部完成, 核心算法只通过该 trait 取数据.
pub trait ZStackSource {
    /// 获取第 `channel` 个通道的体数据.
    fn zstack(&self, channel: usize) -> Result<Volume, ShapeError>;
}

/// 内存中的多通道 z-stack, 按 `(h, w, z, c)` 组织.
#[derive(Debug, Clone)]
pub struct ChannelStack {
    data: Array4<u16>,
}

impl ChannelStack {
    /// 由四维数组直接创建. 任一轴为空时返回 `Err`.
    pub fn new(data: Array4<u16>) -> Result<Self, ShapeError> {
        check_non_empty(data.shape())?;
        Ok(Self { data })
    }

    /// 由若干单通道体数据拼接. 各通道形状必须一致.
    pub fn from_channels(channels: &[Volume]) -> Result<Self, ShapeError> {
        let Some(first) = channels.first() else {
            return Err(ShapeError::EmptyAxis { axis: 3 });
        };
        if let Some(bad) = channels.iter().find(|v| v.shape() != first.shape()) {
            return Err(ShapeError::FrameMismatch {
                expected: first.frame_shape(),
                found: bad.frame_shape(),
            });
        }
        let views: Vec<_> = channels
            .iter()
            .map(|v| v.data().insert_axis(Axis(3)))
            .collect();
        // 形状已一致, 拼接不会失败.
        let data = ndarray::concatenate(Axis(3), &views)
            .map_err(|_| ShapeError::EmptyAxis { axis: 3 })?;
        Self::new(data)
    }

    /// 通道个数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(3))
    }
}

impl ZStackSource for ChannelStack {
    fn zstack(&self, channel: usize) -> Result<Volume, ShapeError> {
        let channels = self.channels();
        if channel >= channels {
            return Err(ShapeError::ChannelOutOfRange { channel, channels });
        }
        Volume::new(self.data.index_axis(Axis(3), channel).to_owned())
    }
}

impl ZStackSource for Volume {
    /// 单通道体数据只有第 0 个通道.
    fn zstack(&self, channel: usize) -> Result<Volume, ShapeError> {
        match channel {
            0 => Ok(self.clone()),
            _ => Err(ShapeError::ChannelOutOfRange {
                channel,
                channels: 1,
            }),
        }
    }
}
