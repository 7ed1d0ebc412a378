//! 基于表面的 z 窗口投影.
//!
//! 每个像素的投影值为 `aggregate(stack[h, w, z_min..z_max])`, 其中
//!
//! - `z_min = clamp(surface - zabove, 0, len_z - 1)`;
//! - `z_max = clamp(surface + 1 + zbelow, z_min + 1, len_z)`.
//!
//! 窗口退化 (空或反向) 时扩展为单层, 不会报错. `zabove`/`zbelow` 可以为负,
//! 此时窗口整体远离表面.

use std::ops::Range;

use ndarray::{Array2, ArrayView1, Axis, Zip};

use crate::data::ShapeError;
use crate::{Parameters, Projection, SurfaceMap, Volume};

mod rank;

pub(crate) use rank::median_filter_2d;
pub use rank::percentile_filter;

/// 以表面为基准的 z 窗口. 两个值都可以为负.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ZWindow {
    /// 表面以上 (z 更小方向) 包含的层数.
    pub above: i64,

    /// 表面以下 (z 更大方向) 包含的层数.
    pub below: i64,
}

impl ZWindow {
    /// 构建窗口.
    #[inline]
    pub const fn new(above: i64, below: i64) -> Self {
        Self { above, below }
    }

    /// 给定表面深度 `surface_z` 和总层数 `len_z`, 求实际参与聚合的 z 范围.
    /// 返回的范围总是非空且不越界.
    pub fn range(&self, surface_z: usize, len_z: usize) -> Range<usize> {
        debug_assert!(len_z > 0);
        let (s, len) = (surface_z as i64, len_z as i64);
        let z_min = s.saturating_sub(self.above).clamp(0, len - 1);
        let z_max = (s + 1).saturating_add(self.below).clamp(z_min + 1, len);
        z_min as usize..z_max as usize
    }
}

/// 窗口内样本的聚合规则.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Aggregator {
    /// 整数均值, 向零截断.
    Mean,

    /// 最大值.
    Max,
}

impl Aggregator {
    /// 聚合一组非空样本.
    fn apply(&self, samples: ArrayView1<'_, u16>) -> u16 {
        debug_assert!(!samples.is_empty());
        match self {
            Aggregator::Mean => {
                let sum: u64 = samples.iter().map(|&v| v as u64).sum();
                (sum / samples.len() as u64) as u16
            }
            Aggregator::Max => samples.iter().copied().max().unwrap_or_default(),
        }
    }
}

/// 按表面 `surface` 和窗口 `window` 对 `stack` 做投影.
///
/// `surface` 必须来自与 `stack` 同平面、同层数的体数据, 否则返回 `Err`.
pub fn project(
    stack: &Volume,
    surface: &SurfaceMap,
    window: ZWindow,
    aggregator: Aggregator,
) -> Result<Projection, ShapeError> {
    if surface.shape() != stack.frame_shape() {
        return Err(ShapeError::FrameMismatch {
            expected: stack.frame_shape(),
            found: surface.shape(),
        });
    }
    if surface.len_z() != stack.len_z() {
        return Err(ShapeError::DepthMismatch {
            expected: stack.len_z(),
            found: surface.len_z(),
        });
    }
    let len_z = stack.len_z();
    let mut projection = Array2::<u16>::zeros(stack.frame_shape());
    let data = stack.data();
    let zip = Zip::from(&mut projection)
        .and(surface.data())
        .and(data.lanes(Axis(2)));

    let pixel = |out: &mut u16, &z: &usize, column: ArrayView1<u16>| {
        *out = aggregator.apply(column.slice(ndarray::s![window.range(z, len_z)]));
    };
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(pixel);
        } else {
            zip.for_each(pixel);
        }
    }
    Ok(projection.into())
}

/// 均值投影.
#[inline]
pub fn mean_project(
    stack: &Volume,
    surface: &SurfaceMap,
    window: ZWindow,
) -> Result<Projection, ShapeError> {
    project(stack, surface, window, Aggregator::Mean)
}

/// 最大值投影.
#[inline]
pub fn max_project(
    stack: &Volume,
    surface: &SurfaceMap,
    window: ZWindow,
) -> Result<Projection, ShapeError> {
    project(stack, surface, window, Aggregator::Max)
}

/// 细胞壁信号投影: 先做百分位滤波去噪, 再以细胞壁窗口做均值投影.
pub fn project_wall(
    wall_stack: &Volume,
    surface: &SurfaceMap,
    params: &Parameters,
) -> Result<Projection, ShapeError> {
    let filtered = percentile_filter(
        wall_stack,
        params.wall_percentile_filter_percentile,
        params.wall_percentile_filter_size,
    );
    mean_project(&filtered, surface, params.wall_window())
}

/// 标记物信号投影: 先做百分位滤波去噪, 再以标记物窗口做最大值投影.
pub fn project_marker(
    marker_stack: &Volume,
    surface: &SurfaceMap,
    params: &Parameters,
) -> Result<Projection, ShapeError> {
    let filtered = percentile_filter(
        marker_stack,
        params.marker_percentile_filter_percentile,
        params.marker_percentile_filter_size,
    );
    max_project(&filtered, surface, params.marker_window())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// `stack[.., .., z] = z`, z 取 0..10.
    fn z_ramp() -> Volume {
        Volume::new(Array3::from_shape_fn((1, 1, 10), |(_, _, z)| z as u16)).unwrap()
    }

    fn mean_at_five(above: i64, below: i64) -> u16 {
        let surface = SurfaceMap::flat((1, 1), 5, 10);
        mean_project(&z_ramp(), &surface, ZWindow::new(above, below)).unwrap()[(0, 0)]
    }

    #[test]
    fn test_mean_project_windows() {
        assert_eq!(mean_at_five(0, 0), 5);
        assert_eq!(mean_at_five(2, 0), 4);
        assert_eq!(mean_at_five(0, 2), 6);
        assert_eq!(mean_at_five(7, 0), 2);
        assert_eq!(mean_at_five(-1, 7), 7);
        assert_eq!(mean_at_five(-6, 7), 9);
        assert_eq!(mean_at_five(7, -6), 0);
    }

    #[test]
    fn test_window_never_empty() {
        for s in 0..10 {
            for above in -12..12 {
                for below in -12..12 {
                    let r = ZWindow::new(above, below).range(s, 10);
                    assert!(r.start < r.end && r.end <= 10, "{s} {above} {below}");
                }
            }
        }
    }

    #[test]
    fn test_extreme_windows() {
        for (above, below) in [(i64::MIN, 0), (i64::MAX, 0), (0, i64::MAX), (0, i64::MIN), (i64::MAX, i64::MIN)] {
            let r = ZWindow::new(above, below).range(5, 10);
            assert!(r.start < r.end && r.end <= 10, "{above} {below}");
        }
        assert_eq!(ZWindow::new(i64::MAX, i64::MAX).range(5, 10), 0..10);
        assert_eq!(ZWindow::new(i64::MIN, 0).range(5, 10), 9..10);
        assert_eq!(mean_at_five(i64::MIN, i64::MIN), 9);
    }

    #[test]
    fn test_max_project() {
        let data = Array3::from_shape_fn((2, 2, 6), |(h, w, z)| ((h + 1) * (w + 2) * (5 - z)) as u16);
        let stack = Volume::new(data).unwrap();
        let surface = SurfaceMap::flat((2, 2), 3, 6);
        let p = max_project(&stack, &surface, ZWindow::new(1, 1)).unwrap();
        // 窗口为 z = 2..5, 列单调递减, 最大值在 z = 2.
        for ((h, w), &v) in p.data().indexed_iter() {
            assert_eq!(v, ((h + 1) * (w + 2) * 3) as u16);
        }
    }

    #[test]
    fn test_project_frame_mismatch() {
        let surface = SurfaceMap::flat((2, 1), 0, 10);
        let err = mean_project(&z_ramp(), &surface, ZWindow::new(0, 0)).unwrap_err();
        assert_eq!(
            err,
            ShapeError::FrameMismatch {
                expected: (1, 1),
                found: (2, 1)
            }
        );
    }

    #[test]
    fn test_project_depth_mismatch() {
        let surface = SurfaceMap::flat((1, 1), 15, 20);
        let err = mean_project(&z_ramp(), &surface, ZWindow::new(0, 0)).unwrap_err();
        assert_eq!(
            err,
            ShapeError::DepthMismatch {
                expected: 10,
                found: 20
            }
        );
    }

    #[test]
    fn test_project_idempotent() {
        let data = Array3::from_shape_fn((5, 4, 7), |(h, w, z)| ((h * 13 + w * 5 + z * 11) % 17) as u16);
        let stack = Volume::new(data).unwrap();
        let surface = crate::surface::surface_from_stack(&stack, 95.0);
        let a = project(&stack, &surface, ZWindow::new(2, 3), Aggregator::Mean).unwrap();
        let b = project(&stack, &surface, ZWindow::new(2, 3), Aggregator::Mean).unwrap();
        assert_eq!(a, b);
    }
}
