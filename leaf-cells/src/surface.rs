//! 表面提取.
//!
//! 对每个 `(h, w)` 列, 以该列自身强度分布的百分位数为阈值 (逐列, 而不是全局阈值),
//! 从 z = 0 向深处扫描, 第一个 **严格大于** 阈值的深度即为表面. 没有任何深度超过阈值时取 0.
//! 这对应扫描进入组织时遇到的第一个强信号边界 (如表皮外壁).

use ndarray::{Array2, ArrayView1, Axis, Zip};

use crate::{SurfaceMap, Volume};

/// 计算 `values` 的第 `p` 百分位数, 在相邻秩之间线性插值.
///
/// `values` 会被原地排序. 若 `values` 为空, 则程序 panic.
pub(crate) fn percentile_linear(values: &mut [u16], p: f64) -> f64 {
    debug_assert!((0.0..=100.0).contains(&p));
    assert!(!values.is_empty());
    values.sort_unstable();
    let rank = p / 100.0 * (values.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    let (a, b) = (values[lo] as f64, values[hi] as f64);
    a + (b - a) * (rank - lo as f64)
}

/// 单列的表面深度.
fn column_surface(column: ArrayView1<'_, u16>, percentile: f64) -> usize {
    let mut buf = column.to_vec();
    let cutoff = percentile_linear(&mut buf, percentile);
    column
        .iter()
        .position(|&v| v as f64 > cutoff)
        .unwrap_or(0)
}

/// 从体数据中提取表面深度图.
///
/// `percentile` 必须位于 `[0, 100]` 内, 否则程序 panic. 结果形状为 `(h, w)`,
/// 每个值都位于 `[0, len_z)` 内. 对相同输入多次运行的结果完全一致.
pub fn surface_from_stack(stack: &Volume, percentile: f64) -> SurfaceMap {
    assert!(
        (0.0..=100.0).contains(&percentile),
        "百分位数必须位于 [0, 100] 内"
    );
    let (h, w, len_z) = stack.shape();
    let mut surface = Array2::<usize>::zeros((h, w));
    let data = stack.data();
    let zip = Zip::from(&mut surface).and(data.lanes(Axis(2)));

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(|s, column| *s = column_surface(column, percentile));
        } else {
            zip.for_each(|s, column| *s = column_surface(column, percentile));
        }
    }
    log::debug!("surface extracted: {h}x{w}, {len_z} slices, p = {percentile}");
    SurfaceMap::new(surface, len_z)
}
