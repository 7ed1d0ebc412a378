//! 细胞分割: 种子生成, 分水岭, 以及按掩码整体剔除细胞.

use ndarray::{Array2, ArrayView2};

use crate::consts::BACKGROUND;
use crate::data::ShapeError;
use crate::{Idx2d, Mask, Projection};

mod label;
mod region;
mod seeds;
mod watershed;

pub use label::{connected_areas, label_components, remove_small_objects};
pub use region::{BoundingBox, Region};
pub use seeds::{build_seeds, seeds_from_params, threshold_adaptive_median};
pub use watershed::watershed;

/// 覆盖整幅图像的分割结果: 每个像素一个编号 (0 为背景), 以及按编号索引的区域表.
///
/// # 注意
///
/// 区域表的第 0 个槽位恒为空 (背景). 编号可以不连续, 但互不重复,
/// 每个非背景像素恰好属于一个区域.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segmentation {
    labels: Array2<u32>,
    regions: Vec<Option<Region>>,
}

impl Segmentation {
    /// 由标记图像创建, 编号即像素值.
    pub fn from_labels(labels: Array2<u32>) -> Self {
        let frame = labels.dim();
        let max_id = labels.iter().copied().max().unwrap_or(BACKGROUND) as usize;
        let mut pixels: Vec<Vec<Idx2d>> = vec![Vec::new(); max_id + 1];
        for (pos, &id) in labels.indexed_iter() {
            if id != BACKGROUND {
                pixels[id as usize].push(pos);
            }
        }
        let regions = pixels
            .into_iter()
            .enumerate()
            .map(|(id, px)| match id {
                0 => None,
                _ if px.is_empty() => None,
                _ => Some(Region::new(id as u32, px, frame)),
            })
            .collect();
        Self { labels, regions }
    }

    /// 全为背景的分割.
    pub fn empty(frame: Idx2d) -> Self {
        Self::from_labels(Array2::from_elem(frame, BACKGROUND))
    }

    /// 图像大小 `(h, w)`.
    #[inline]
    pub fn frame(&self) -> Idx2d {
        self.labels.dim()
    }

    /// 标记图像.
    #[inline]
    pub fn labels(&self) -> ArrayView2<'_, u32> {
        self.labels.view()
    }

    /// `pos` 处的编号. 越界时 panic.
    #[inline]
    pub fn label_at(&self, pos: Idx2d) -> u32 {
        self.labels[pos]
    }

    /// 升序排列的全部区域编号.
    pub fn identifiers(&self) -> impl Iterator<Item = u32> + '_ {
        self.regions().map(Region::identifier)
    }

    /// 按编号升序遍历全部区域.
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter().flatten()
    }

    /// 按编号查找区域.
    #[inline]
    pub fn region_by_identifier(&self, id: u32) -> Option<&Region> {
        self.regions.get(id as usize).and_then(Option::as_ref)
    }

    /// 区域个数.
    pub fn len(&self) -> usize {
        self.regions().count()
    }

    /// 是否没有任何区域.
    pub fn is_empty(&self) -> bool {
        self.regions().next().is_none()
    }

    /// 把编号为 `id` 的整个区域置为背景, 返回被移除的区域.
    pub fn remove_region(&mut self, id: u32) -> Option<Region> {
        let region = self.regions.get_mut(id as usize)?.take()?;
        for &pos in region.pixels() {
            self.labels[pos] = BACKGROUND;
        }
        Some(region)
    }

    /// 剔除所有与掩码外部有交集的区域 (整体剔除, 不做裁剪). 返回被剔除的区域个数.
    pub fn filter_by_mask(&mut self, mask: &Mask) -> Result<usize, ShapeError> {
        mask.check_frame(self.frame())?;
        let rejected: Vec<u32> = self
            .regions()
            .filter(|r| r.pixels().iter().any(|&pos| !mask.contains(pos)))
            .map(Region::identifier)
            .collect();
        for &id in &rejected {
            self.remove_region(id);
        }
        Ok(rejected.len())
    }

    /// 直接获得标记图像.
    #[inline]
    pub fn into_raw(self) -> Array2<u32> {
        self.labels
    }
}

/// 以细胞壁亮度为地形, 从 `seeds` 出发做分水岭, 再按 `mask` 整体剔除细胞.
///
/// 种子为空时返回全背景的分割. `seeds` 或 `mask` 与 `wall` 大小不一致时返回 `Err`.
pub fn segment_cells(
    wall: &Projection,
    seeds: &Segmentation,
    mask: Option<&Mask>,
) -> Result<Segmentation, ShapeError> {
    if seeds.frame() != wall.shape() {
        return Err(ShapeError::FrameMismatch {
            expected: wall.shape(),
            found: seeds.frame(),
        });
    }
    if let Some(mask) = mask {
        mask.check_frame(wall.shape())?;
    }
    if seeds.is_empty() {
        log::debug!("no seeds, the segmentation is empty");
        return Ok(Segmentation::empty(wall.shape()));
    }

    let mut cells = Segmentation::from_labels(watershed(wall.data(), seeds.labels()));
    if let Some(mask) = mask {
        let rejected = cells.filter_by_mask(mask)?;
        log::debug!("{rejected} cell(s) touch the outside of the mask");
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_labels() {
        let seg = Segmentation::from_labels(array![[0, 3, 3], [5, 0, 3], [5, 5, 0]]);
        assert_eq!(seg.identifiers().collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.region_by_identifier(3).unwrap().area(), 3);
        assert!(seg.region_by_identifier(0).is_none());
        assert!(seg.region_by_identifier(4).is_none());
        assert!(seg.region_by_identifier(99).is_none());
        assert!(Segmentation::empty((2, 2)).is_empty());
    }

    #[test]
    fn test_regions_are_disjoint_and_cover_foreground() {
        let wall = seeds::tests::two_basins();
        let seeds = build_seeds(&wall, 3, 2, 5).unwrap();
        let cells = segment_cells(&wall, &seeds, None).unwrap();

        let mut owner = Array2::<u32>::zeros(cells.frame());
        for region in cells.regions() {
            for &pos in region.pixels() {
                assert_eq!(owner[pos], 0, "{pos:?} claimed twice");
                owner[pos] = region.identifier();
            }
        }
        assert_eq!(owner.view(), cells.labels());
        // 所有像素都可从种子到达.
        assert!(cells.labels().iter().all(|&l| l != 0));
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_mask_rejects_whole_region() {
        let wall = seeds::tests::two_basins();
        let seeds = build_seeds(&wall, 3, 2, 5).unwrap();
        let mut roi = Array2::from_elem(wall.shape(), true);
        // 右侧细胞只有一个像素落在掩码之外.
        roi[(6, 12)] = false;
        let mask = Mask::from(roi);

        let cells = segment_cells(&wall, &seeds, Some(&mask)).unwrap();
        let unmasked = segment_cells(&wall, &seeds, None).unwrap();
        let right = unmasked.label_at((6, 12));

        assert!(!cells.identifiers().any(|id| id == right));
        assert!(cells.region_by_identifier(right).is_none());
        for &pos in unmasked.region_by_identifier(right).unwrap().pixels() {
            assert_eq!(cells.label_at(pos), 0);
        }
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn test_empty_seeds() {
        let wall = seeds::tests::two_basins();
        let seeds = Segmentation::empty(wall.shape());
        let cells = segment_cells(&wall, &seeds, None).unwrap();
        assert!(cells.is_empty());
        assert!(cells.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_frame_mismatch() {
        let wall = seeds::tests::two_basins();
        let seeds = build_seeds(&wall, 3, 2, 5).unwrap();
        let mask = Mask::full((3, 3));
        assert!(matches!(
            segment_cells(&wall, &seeds, Some(&mask)),
            Err(ShapeError::FrameMismatch { .. })
        ));
    }
}
