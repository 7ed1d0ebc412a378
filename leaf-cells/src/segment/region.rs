use ndarray::Array2;

use super::label::n4_positions;
use crate::{Idx2d, Point2d};

/// 闭区间包围盒 `[min, max]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    /// 左上角 `(h, w)`.
    pub min: Idx2d,

    /// 右下角 `(h, w)`, 包含在盒内.
    pub max: Idx2d,
}

impl BoundingBox {
    /// 盒的高度.
    #[inline]
    pub fn height(&self) -> usize {
        self.max.0 - self.min.0 + 1
    }

    /// 盒的宽度.
    #[inline]
    pub fn width(&self) -> usize {
        self.max.1 - self.min.1 + 1
    }

    /// `(height, width)`.
    #[inline]
    pub fn dim(&self) -> Idx2d {
        (self.height(), self.width())
    }
}

/// 二维图像中一个带编号的像素集合.
///
/// # 注意
///
/// 像素按行优先顺序保存且互不重复, 因此成员判断为 `O(log n)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    id: u32,
    pixels: Vec<Idx2d>,
    frame: Idx2d,
}

impl Region {
    /// 由像素集合创建编号为 `id` 的区域. `frame` 为所在图像的大小.
    ///
    /// 若 `pixels` 为空, 或有像素超出 `frame`, 则程序 panic.
    pub fn new(id: u32, mut pixels: Vec<Idx2d>, frame: Idx2d) -> Self {
        assert!(!pixels.is_empty(), "区域不能为空");
        assert!(
            pixels.iter().all(|&(h, w)| h < frame.0 && w < frame.1),
            "区域超出图像范围"
        );
        pixels.sort_unstable();
        pixels.dedup();
        Self { id, pixels, frame }
    }

    /// 区域编号, 恒为正.
    #[inline]
    pub fn identifier(&self) -> u32 {
        self.id
    }

    /// 行优先排列的全部像素.
    #[inline]
    pub fn pixels(&self) -> &[Idx2d] {
        &self.pixels
    }

    /// 像素个数.
    #[inline]
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// 所在图像的大小 `(h, w)`.
    #[inline]
    pub fn frame(&self) -> Idx2d {
        self.frame
    }

    /// `pos` 是否属于该区域.
    #[inline]
    pub fn contains(&self, pos: Idx2d) -> bool {
        self.pixels.binary_search(&pos).is_ok()
    }

    /// 质心 `(y, x)`.
    pub fn centroid(&self) -> Point2d {
        let (sy, sx) = self
            .pixels
            .iter()
            .fold((0usize, 0usize), |(sy, sx), &(h, w)| (sy + h, sx + w));
        let n = self.area() as f64;
        (sy as f64 / n, sx as f64 / n)
    }

    /// 包围盒.
    pub fn bbox(&self) -> BoundingBox {
        // 像素按行排序, 首尾即为行的最小/最大值.
        let h_min = self.pixels[0].0;
        let h_max = self.pixels[self.pixels.len() - 1].0;
        let w_min = self.pixels.iter().map(|p| p.1).min().unwrap_or(0);
        let w_max = self.pixels.iter().map(|p| p.1).max().unwrap_or(0);
        BoundingBox {
            min: (h_min, w_min),
            max: (h_max, w_max),
        }
    }

    /// 边界像素: 至少有一个 4-邻居不在区域内 (或位于图像之外) 的像素.
    pub fn border(&self) -> Vec<Idx2d> {
        self.pixels
            .iter()
            .copied()
            .filter(|&pos| {
                let inner = n4_positions(pos, self.frame).filter(|&n| self.contains(n));
                inner.count() < 4
            })
            .collect()
    }

    /// 十字形结构元膨胀 `n` 次, 结果被裁剪在图像内. 编号不变.
    pub fn dilate(&self, n: usize) -> Region {
        let bbox = self.bbox();
        let top = bbox.min.0.saturating_sub(n);
        let left = bbox.min.1.saturating_sub(n);
        let bottom = (bbox.max.0 + n).min(self.frame.0 - 1);
        let right = (bbox.max.1 + n).min(self.frame.1 - 1);
        let local = (bottom - top + 1, right - left + 1);

        let mut grid = Array2::from_elem(local, false);
        for &(h, w) in &self.pixels {
            grid[(h - top, w - left)] = true;
        }
        for _ in 0..n {
            let prev = grid.clone();
            for ((h, w), &inside) in prev.indexed_iter() {
                if inside {
                    for neigh in n4_positions((h, w), local) {
                        grid[neigh] = true;
                    }
                }
            }
        }
        let pixels = grid
            .indexed_iter()
            .filter(|(_, &inside)| inside)
            .map(|((h, w), _)| (h + top, w + left))
            .collect();
        Region::new(self.id, pixels, self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: u32, top: usize, left: usize, side: usize, frame: Idx2d) -> Region {
        let pixels = (top..top + side)
            .flat_map(|h| (left..left + side).map(move |w| (h, w)))
            .collect();
        Region::new(id, pixels, frame)
    }

    #[test]
    fn test_basic_attributes() {
        let r = square(3, 2, 4, 3, (10, 10));
        assert_eq!(r.identifier(), 3);
        assert_eq!(r.area(), 9);
        assert_eq!(r.centroid(), (3.0, 5.0));
        assert_eq!(
            r.bbox(),
            BoundingBox {
                min: (2, 4),
                max: (4, 6)
            }
        );
        assert_eq!(r.bbox().dim(), (3, 3));
        assert!(r.contains((3, 5)));
        assert!(!r.contains((5, 5)));
    }

    #[test]
    fn test_border() {
        let r = square(1, 2, 2, 3, (10, 10));
        let border = r.border();
        assert_eq!(border.len(), 8);
        assert!(!border.contains(&(3, 3)));

        // 贴着图像边缘的像素同样算作边界.
        let whole = square(1, 0, 0, 3, (3, 3));
        assert_eq!(whole.border().len(), 8);
    }

    #[test]
    fn test_dilate() {
        let r = Region::new(7, vec![(5, 5)], (11, 11));
        let d = r.dilate(2);
        assert_eq!(d.identifier(), 7);
        // 曼哈顿距离不超过 2 的菱形.
        assert_eq!(d.area(), 13);
        assert!(d.contains((3, 5)) && d.contains((6, 6)) && !d.contains((7, 7)));
        assert_eq!(r.dilate(0), r);
    }

    #[test]
    fn test_dilate_clipped_to_frame() {
        let r = Region::new(1, vec![(0, 0)], (4, 4));
        let d = r.dilate(1);
        assert_eq!(d.pixels(), &[(0, 0), (0, 1), (1, 0)]);
        assert_eq!(r.dilate(10).area(), 16);
    }
}
