//! 分水岭种子.
//!
//! 细胞壁投影中细胞壁是亮的细线, 细胞内部是暗的大块区域. 种子是取反后的细胞内部.

use ndarray::{Array2, ArrayView2, Zip};

use super::label::{label_components, remove_small_objects};
use super::Segmentation;
use crate::projection::median_filter_2d;
use crate::{ConfigError, Parameters, Projection};

/// 局部中值自适应阈值. 前景为严格大于 `block_size * block_size` 邻域中值的像素.
///
/// # 注意
///
/// 局部阈值取邻域中值, 而不是 scikit-image `threshold_local` 默认的高斯加权均值,
/// 两者在细胞壁附近的结果会有差异.
///
/// `block_size` 必须为奇数, 否则返回 `Err`.
pub fn threshold_adaptive_median(
    image: ArrayView2<'_, u16>,
    block_size: usize,
) -> Result<Array2<bool>, ConfigError> {
    if block_size % 2 == 0 {
        return Err(ConfigError::InvalidValue {
            key: "wall_threshold_adaptive_block_size",
            reason: format!("block size {block_size} is not odd"),
        });
    }
    let local = median_filter_2d(image, block_size);
    Ok(Zip::from(&image)
        .and(&local)
        .map_collect(|&pixel, &threshold| pixel > threshold))
}

/// 由细胞壁投影生成种子分割.
///
/// 1. 自适应阈值得到细胞壁前景;
/// 2. 去除面积小于 `in_cell_min_size` 的前景 (细胞内部的噪点);
/// 3. 取反;
/// 4. 去除面积小于 `in_wall_min_size` 的前景 (细胞壁缺口处的碎片);
/// 5. 4-连通标记.
pub fn build_seeds(
    wall: &Projection,
    block_size: usize,
    in_cell_min_size: usize,
    in_wall_min_size: usize,
) -> Result<Segmentation, ConfigError> {
    let mut binary = threshold_adaptive_median(wall.data(), block_size)?;
    remove_small_objects(&mut binary, in_cell_min_size);
    binary.mapv_inplace(|fg| !fg);
    remove_small_objects(&mut binary, in_wall_min_size);
    let seeds = Segmentation::from_labels(label_components(binary.view()));
    log::debug!("{} seed(s) found", seeds.len());
    Ok(seeds)
}

/// 使用 `params` 中的细胞壁参数调用 [`build_seeds`].
#[inline]
pub fn seeds_from_params(wall: &Projection, params: &Parameters) -> Result<Segmentation, ConfigError> {
    build_seeds(
        wall,
        params.wall_threshold_adaptive_block_size,
        params.wall_remove_small_objects_in_cell_min_size,
        params.wall_remove_small_objects_in_wall_min_size,
    )
}
