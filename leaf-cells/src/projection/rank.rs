//! 秩滤波 (百分位滤波 / 中值滤波).
//!
//! 滤波窗口为边长 `size` 的立方体 (或正方形), 窗口起点为 `i - size / 2`.
//! 越界部分按 reflect 规则取值: `d c b a | a b c d | d c b a`.

use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2, Axis};

use crate::Volume;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 按 reflect 规则把可能越界的索引 `i` 折回 `[0, len)`.
#[inline]
pub(crate) fn reflect(i: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as isize;
    let period = 2 * len;
    let i = i.rem_euclid(period);
    (if i >= len { period - 1 - i } else { i }) as usize
}

/// 以 `center` 为中心、长为 `size` 的窗口内的 (折回后的) 索引.
#[inline]
fn window(center: usize, size: usize, len: usize) -> impl Iterator<Item = usize> + Clone {
    let start = center as isize - (size / 2) as isize;
    (start..start + size as isize).map(move |i| reflect(i, len))
}

/// 在 `n` 个样本中, 第 `percentile` 百分位对应的秩 (从 0 开始).
#[inline]
pub(crate) fn percentile_rank(n: usize, percentile: f64) -> usize {
    debug_assert!(n > 0);
    if percentile >= 100.0 {
        n - 1
    } else {
        (n as f64 * percentile / 100.0) as usize
    }
}

/// 三维百分位滤波, 用于投影前的去噪.
///
/// `size` 为立方体窗口的边长, 必须非 0; `percentile` 必须位于 `[0, 100]` 内.
/// 否则程序 panic.
pub fn percentile_filter(stack: &Volume, percentile: f64, size: usize) -> Volume {
    assert!(size >= 1, "滤波窗口不能为空");
    assert!(
        (0.0..=100.0).contains(&percentile),
        "百分位数必须位于 [0, 100] 内"
    );
    let (h, w, z) = stack.shape();
    let n = size.pow(3);
    let rank = percentile_rank(n, percentile);
    let data = stack.data();

    // 每个 h 切片独立计算, 互不重叠.
    let filter_slab = |i: usize, mut slab: ArrayViewMut2<u16>| {
        let mut buf = Vec::with_capacity(n);
        for ((j, k), out) in slab.indexed_iter_mut() {
            buf.clear();
            for di in window(i, size, h) {
                for dj in window(j, size, w) {
                    buf.extend(window(k, size, z).map(|dk| data[(di, dj, dk)]));
                }
            }
            *out = *buf.select_nth_unstable(rank).1;
        }
    };

    let mut filtered = Array3::<u16>::zeros((h, w, z));
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            filtered
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(i, slab)| filter_slab(i, slab));
        } else {
            filtered
                .axis_iter_mut(Axis(0))
                .enumerate()
                .for_each(|(i, slab)| filter_slab(i, slab));
        }
    }
    Volume::new_unchecked(filtered)
}

/// 二维中值滤波, 窗口为 `size * size` 的正方形.
///
/// `size` 必须非 0, 否则程序 panic.
pub(crate) fn median_filter_2d(image: ArrayView2<'_, u16>, size: usize) -> Array2<u16> {
    assert!(size >= 1, "滤波窗口不能为空");
    let (h, w) = image.dim();
    let n = size * size;
    let rank = percentile_rank(n, 50.0);
    let mut buf = Vec::with_capacity(n);
    Array2::from_shape_fn((h, w), |(i, j)| {
        buf.clear();
        for di in window(i, size, h) {
            buf.extend(window(j, size, w).map(|dj| image[(di, dj)]));
        }
        *buf.select_nth_unstable(rank).1
    })
}
