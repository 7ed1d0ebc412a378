use ndarray::{Array2, ArrayView2};

use super::{original_image_point, original_image_point_exact, Rotation};
use crate::consts::crop;
use crate::data::ShapeError;
use crate::segment::Region;
use crate::Point2d;

/// 截图参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CropSpec {
    /// 裁剪前对区域做十字膨胀的次数.
    pub dilation: usize,

    /// 四周填充的像素数.
    pub pad: usize,

    /// 最近邻放大倍数, 必须非 0.
    pub scale: usize,
}

impl Default for CropSpec {
    fn default() -> Self {
        Self {
            dilation: crop::DILATION,
            pad: crop::PAD,
            scale: crop::SCALE,
        }
    }
}

/// 一个细胞截图从原图到相对坐标系的完整变换.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransformChain {
    /// 填充后截图左上角在原图中的行偏移, 可能为负.
    pub dy_offset: i64,

    /// 填充后截图左上角在原图中的列偏移, 可能为负.
    pub dx_offset: i64,

    /// 填充后 (未放大) 的高度.
    pub ydim: usize,

    /// 填充后 (未放大) 的宽度.
    pub xdim: usize,

    /// 放大倍数.
    pub scale: usize,

    /// 截图的逆时针旋转角度.
    pub rotation: Rotation,
}

impl TransformChain {
    /// 由区域构建变换. 区域先膨胀 `spec.dilation` 次, 再取 (闭区间) 包围盒.
    pub fn from_region(region: &Region, spec: &CropSpec, rotation: Rotation) -> Self {
        Self::from_dilated(&region.dilate(spec.dilation), spec, rotation)
    }

    fn from_dilated(dilated: &Region, spec: &CropSpec, rotation: Rotation) -> Self {
        let bbox = dilated.bbox();
        let pad = spec.pad as i64;
        Self {
            dy_offset: bbox.min.0 as i64 - pad,
            dx_offset: bbox.min.1 as i64 - pad,
            ydim: bbox.height() + 2 * spec.pad,
            xdim: bbox.width() + 2 * spec.pad,
            scale: spec.scale,
            rotation,
        }
    }

    /// 最终截图 (放大并旋转后) 的形状 `(rows, cols)`.
    pub fn displayed_dims(&self) -> (usize, usize) {
        let (h, w) = (self.ydim * self.scale, self.xdim * self.scale);
        match self.rotation {
            Rotation::R0 | Rotation::R180 => (h, w),
            Rotation::R90 | Rotation::R270 => (w, h),
        }
    }

    /// 原图坐标 -> 截图上的相对坐标. 是 [`TransformChain::to_image_exact`] 的精确逆.
    pub fn to_relative(&self, (y, x): Point2d) -> Point2d {
        let y_rel = (y - self.dy_offset as f64) / self.ydim as f64 - 0.5;
        let x_rel = (x - self.dx_offset as f64) / self.xdim as f64 - 0.5;
        self.rotation.rotate_counter_clockwise((y_rel, x_rel))
    }

    /// 截图上的相对坐标 -> 原图坐标 (取整前).
    pub fn to_image_exact(&self, relative: Point2d) -> Point2d {
        original_image_point_exact(
            relative,
            self.rotation,
            self.ydim,
            self.xdim,
            self.dy_offset,
            self.dx_offset,
        )
    }

    /// 截图上的相对坐标 -> 原图像素坐标.
    pub fn to_image(&self, relative: Point2d) -> (i64, i64) {
        original_image_point(
            relative,
            self.rotation,
            self.ydim,
            self.xdim,
            self.dy_offset,
            self.dx_offset,
        )
    }
}

/// 逆时针旋转图像.
fn rotate_image<T: Copy>(image: ArrayView2<'_, T>, rotation: Rotation) -> Array2<T> {
    let (h, w) = image.dim();
    match rotation {
        Rotation::R0 => image.to_owned(),
        Rotation::R90 => Array2::from_shape_fn((w, h), |(i, j)| image[(j, w - 1 - i)]),
        Rotation::R180 => Array2::from_shape_fn((h, w), |(i, j)| image[(h - 1 - i, w - 1 - j)]),
        Rotation::R270 => Array2::from_shape_fn((w, h), |(i, j)| image[(h - 1 - j, i)]),
    }
}

/// 从原图中截取 `region` 所在的细胞截图.
///
/// 依次执行膨胀、裁剪、填充、最近邻放大、逆时针旋转. 膨胀后区域之外的像素置为 `T::default()`.
///
/// # 返回值
///
/// 截图及其变换. `image` 与区域所在图像大小不一致时返回 `Err`.
pub fn extract_crop<T: Copy + Default>(
    image: ArrayView2<'_, T>,
    region: &Region,
    spec: &CropSpec,
    rotation: Rotation,
) -> Result<(Array2<T>, TransformChain), ShapeError> {
    if image.dim() != region.frame() {
        return Err(ShapeError::FrameMismatch {
            expected: region.frame(),
            found: image.dim(),
        });
    }
    assert!(spec.scale >= 1, "放大倍数不能为 0");
    let dilated = region.dilate(spec.dilation);
    let chain = TransformChain::from_dilated(&dilated, spec, rotation);

    let mut padded = Array2::from_elem((chain.ydim, chain.xdim), T::default());
    for &(h, w) in dilated.pixels() {
        // 偏移量已包含填充, 差值非负.
        let local = (
            (h as i64 - chain.dy_offset) as usize,
            (w as i64 - chain.dx_offset) as usize,
        );
        padded[local] = image[(h, w)];
    }
    let s = chain.scale;
    let enlarged = Array2::from_shape_fn((chain.ydim * s, chain.xdim * s), |(i, j)| {
        padded[(i / s, j / s)]
    });
    Ok((rotate_image(enlarged.view(), rotation), chain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// 10x12 图像中一个 L 形细胞.
    fn l_cell() -> Region {
        let pixels = vec![(3, 4), (4, 4), (5, 4), (5, 5), (5, 6)];
        Region::new(1, pixels, (10, 12))
    }

    #[test]
    fn test_chain_from_region() {
        let spec = CropSpec {
            dilation: 1,
            pad: 2,
            scale: 3,
        };
        let chain = TransformChain::from_region(&l_cell(), &spec, Rotation::R90);
        // 膨胀后包围盒为 [2, 6] x [3, 7].
        assert_eq!(chain.dy_offset, 0);
        assert_eq!(chain.dx_offset, 1);
        assert_eq!((chain.ydim, chain.xdim), (9, 9));
        assert_eq!(chain.displayed_dims(), (27, 27));

        // 贴近边缘的细胞, 偏移量为负. 膨胀 20 次后覆盖整幅图像.
        let corner = Region::new(1, vec![(0, 0)], (10, 12));
        let chain = TransformChain::from_region(&corner, &CropSpec::default(), Rotation::R0);
        assert_eq!((chain.dy_offset, chain.dx_offset), (-25, -25));
        assert_eq!((chain.ydim, chain.xdim), (60, 62));
    }

    #[test]
    fn test_rotate_image_counter_clockwise() {
        let image = array![[1, 2, 3], [4, 5, 6]];
        assert_eq!(rotate_image(image.view(), Rotation::R90), array![[3, 6], [2, 5], [1, 4]]);
        assert_eq!(rotate_image(image.view(), Rotation::R180), array![[6, 5, 4], [3, 2, 1]]);
        assert_eq!(rotate_image(image.view(), Rotation::R270), array![[4, 1], [5, 2], [6, 3]]);
    }

    #[test]
    fn test_integer_pixels_round_trip() {
        let spec = CropSpec {
            dilation: 1,
            pad: 3,
            scale: 3,
        };
        for rotation in Rotation::ALL {
            let chain = TransformChain::from_region(&l_cell(), &spec, rotation);
            for dy in 0..chain.ydim as i64 {
                for dx in 0..chain.xdim as i64 {
                    let p = (chain.dy_offset + dy, chain.dx_offset + dx);
                    let rel = chain.to_relative((p.0 as f64, p.1 as f64));
                    assert_eq!(chain.to_image(rel), p, "{rotation}");
                }
            }
        }
    }

    #[test]
    fn test_crop_agrees_with_inverse_mapping() {
        let image = Array2::from_shape_fn((10, 12), |(h, w)| (h * 12 + w + 1) as u32);
        let spec = CropSpec {
            dilation: 1,
            pad: 2,
            scale: 3,
        };
        let dilated = l_cell().dilate(spec.dilation);
        for rotation in Rotation::ALL {
            let (crop, chain) = extract_crop(image.view(), &l_cell(), &spec, rotation).unwrap();
            let (rows, cols) = crop.dim();
            assert_eq!((rows, cols), chain.displayed_dims());
            for ((i, j), &v) in crop.indexed_iter() {
                // 显示像素中心的相对坐标.
                let rel = (
                    (i as f64 + 0.5) / rows as f64 - 0.5,
                    (j as f64 + 0.5) / cols as f64 - 0.5,
                );
                let (y, x) = chain.to_image_exact(rel);
                let pos = (y.floor() as usize, x.floor() as usize);
                if v == 0 {
                    assert!(!dilated.contains(pos), "{rotation} {pos:?}");
                } else {
                    assert_eq!(image[pos], v, "{rotation} {pos:?}");
                }
            }
        }
    }

    #[test]
    fn test_crop_frame_mismatch() {
        let image = Array2::<u8>::zeros((4, 4));
        assert!(extract_crop(image.view(), &l_cell(), &CropSpec::default(), Rotation::R0).is_err());
    }
}
