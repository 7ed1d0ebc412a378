use std::ops::Index;

use ndarray::{Array2, ArrayView2};

use super::ShapeError;
use crate::Idx2d;

/// 表面深度图. 每个 `(h, w)` 恰好对应一个 z 索引, 取值范围 `[0, len_z)`.
///
/// 由 [`crate::surface::surface_from_stack`] 生成, 之后不再修改.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMap {
    data: Array2<usize>,
    len_z: usize,
}

impl Index<Idx2d> for SurfaceMap {
    type Output = usize;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl SurfaceMap {
    /// 直接创建. `len_z` 为来源体数据的层数.
    ///
    /// 若存在 `>= len_z` 的深度值, 则程序 panic.
    pub fn new(data: Array2<usize>, len_z: usize) -> Self {
        assert!(data.iter().all(|&z| z < len_z), "表面深度越界");
        Self { data, len_z }
    }

    /// 所有位置深度相同的表面.
    pub fn flat(shape: Idx2d, z: usize, len_z: usize) -> Self {
        Self::new(Array2::from_elem(shape, z), len_z)
    }

    /// 平面形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 来源体数据的层数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.len_z
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, usize> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<usize> {
        self.data
    }
}

/// 投影图像, 与体数据取值范围相同.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    data: Array2<u16>,
}

impl Index<Idx2d> for Projection {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array2<u16>> for Projection {
    #[inline]
    fn from(data: Array2<u16>) -> Self {
        Self { data }
    }
}

impl Projection {
    /// 平面形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, u16> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u16> {
        self.data
    }
}

/// 感兴趣区域 (ROI) 掩码. `false` 表示该像素位于感兴趣区域之外.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    data: Array2<bool>,
}

impl Index<Idx2d> for Mask {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array2<bool>> for Mask {
    #[inline]
    fn from(data: Array2<bool>) -> Self {
        Self { data }
    }
}

impl Mask {
    /// 由单通道图像创建, 像素值为 0 的位置视为感兴趣区域之外.
    pub fn from_image<T: Copy + Default + PartialEq>(image: ArrayView2<'_, T>) -> Self {
        let zero = T::default();
        Self {
            data: image.mapv(|p| p != zero),
        }
    }

    /// 全部位于感兴趣区域之内的掩码.
    pub fn full(shape: Idx2d) -> Self {
        Self {
            data: Array2::from_elem(shape, true),
        }
    }

    /// 平面形状 `(h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// `pos` 是否位于感兴趣区域之内. 越界视为不在区域内.
    #[inline]
    pub fn contains(&self, pos: Idx2d) -> bool {
        self.data.get(pos).copied().unwrap_or(false)
    }

    /// 检查掩码与 `frame` 大小一致.
    pub fn check_frame(&self, frame: Idx2d) -> Result<(), ShapeError> {
        if self.shape() == frame {
            Ok(())
        } else {
            Err(ShapeError::FrameMismatch {
                expected: frame,
                found: self.shape(),
            })
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, bool> {
        self.data.view()
    }
}
