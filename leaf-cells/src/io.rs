//! 与磁盘交互的薄加载层. 核心算法本身从不做 I/O.
//!
//! - 体数据: `.npy`, `(h, w, z)` 或 `(h, w, z, c)`, `u16`;
//! - 掩码: `.npy` (`u8` 或 `bool`) 或任意 8 位灰度图像;
//! - 投影 / 深度图 / 分割: `.npy`;
//! - 细胞截图: 16 位灰度 PNG;
//! - 细胞记录: `cell-{id:05}.json`.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayD, ArrayView2, Ix4};
use ndarray_npy::{read_npy, write_npy};

use crate::data::ShapeError;
use crate::segment::Segmentation;
use crate::{CellRecord, ChannelStack, LeafResult, Mask, Projection, SurfaceMap, Volume};

/// 读取单通道体数据.
pub fn read_volume<P: AsRef<Path>>(path: P) -> LeafResult<Volume> {
    let data: ArrayD<u16> = read_npy(path)?;
    Ok(Volume::from_dyn(data)?)
}

/// 读取多通道 z-stack. 三维数组视为只有一个通道.
pub fn read_channel_stack<P: AsRef<Path>>(path: P) -> LeafResult<ChannelStack> {
    let data: ArrayD<u16> = read_npy(path)?;
    let stack = match data.ndim() {
        3 => ChannelStack::from_channels(&[Volume::from_dyn(data)?])?,
        4 => {
            let found = data.ndim();
            let data = data
                .into_dimensionality::<Ix4>()
                .map_err(|_| ShapeError::Dimensionality { expected: 4, found })?;
            ChannelStack::new(data)?
        }
        found => return Err(ShapeError::Dimensionality { expected: 4, found }.into()),
    };
    log::debug!("{} channel(s) loaded", stack.channels());
    Ok(stack)
}

/// 读取掩码. `.npy` 文件按数组读取, 其它扩展名按图像解码为 8 位灰度.
/// 值为 0 的像素位于感兴趣区域之外.
pub fn read_mask<P: AsRef<Path>>(path: P) -> LeafResult<Mask> {
    let path = path.as_ref();
    let is_npy = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("npy"));
    if is_npy {
        let data: Array2<u8> = match read_npy(path) {
            Ok(data) => data,
            Err(_) => read_npy::<_, Array2<bool>>(path)?.mapv(u8::from),
        };
        return Ok(Mask::from_image(data.view()));
    }

    let gray = image::open(path)?.into_luma8();
    let (width, height) = gray.dimensions();
    let data = Array2::from_shape_fn((height as usize, width as usize), |(h, w)| {
        gray.get_pixel(w as u32, h as u32)[0]
    });
    Ok(Mask::from_image(data.view()))
}

/// 保存投影.
pub fn write_projection<P: AsRef<Path>>(path: P, projection: &Projection) -> LeafResult<()> {
    write_npy(path, &projection.data())?;
    Ok(())
}

/// 保存表面深度图 (`u64`).
pub fn write_surface<P: AsRef<Path>>(path: P, surface: &SurfaceMap) -> LeafResult<()> {
    write_npy(path, &surface.data().mapv(|z| z as u64))?;
    Ok(())
}

/// 保存分割的标记图像 (`u32`).
pub fn write_labels<P: AsRef<Path>>(path: P, segmentation: &Segmentation) -> LeafResult<()> {
    write_npy(path, &segmentation.labels())?;
    Ok(())
}

/// 以 16 位灰度 PNG 保存二维图像.
pub fn save_png16<P: AsRef<Path>>(path: P, image: ArrayView2<'_, u16>) -> LeafResult<()> {
    let (height, width) = image.dim();
    let mut buf = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::new(width as u32, height as u32);
    for ((h, w), &pix) in image.indexed_iter() {
        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
    }
    buf.save(path)?;
    Ok(())
}

/// 细胞记录在 `dir` 中的文件名前缀, 如 `cell-00007`.
pub fn cell_file_prefix<P: AsRef<Path>>(dir: P, cell_id: u32) -> PathBuf {
    dir.as_ref().join(format!("cell-{cell_id:05}"))
}

/// 把细胞记录写入 `dir/cell-{id:05}.json`, 返回文件路径.
pub fn write_cell_record<P: AsRef<Path>>(dir: P, record: &CellRecord) -> LeafResult<PathBuf> {
    let path = cell_file_prefix(dir, record.cell_id).with_extension("json");
    fs::write(&path, record.to_json()?)?;
    Ok(path)
}

/// 读取单个细胞记录.
pub fn read_cell_record<P: AsRef<Path>>(path: P) -> LeafResult<CellRecord> {
    CellRecord::from_json(&fs::read_to_string(path)?)
}

/// 读取 `dir` 中全部 `.json` 细胞记录, 按文件名排序.
pub fn read_cell_records<P: AsRef<Path>>(dir: P) -> LeafResult<Vec<CellRecord>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(read_cell_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;
    use ndarray::{Array3, Array4};

    /// 测试专用的临时目录, 在 drop 时删除.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("leaf-cells-{name}-{}", std::process::id()));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_volume_npy() {
        let tmp = TempDir::new("volume");
        let path = tmp.0.join("v.npy");
        let data = Array3::from_shape_fn((2, 3, 4), |(h, w, z)| (h * 100 + w * 10 + z) as u16);
        write_npy(&path, &data).unwrap();
        assert_eq!(read_volume(&path).unwrap().into_raw(), data);

        let stack = read_channel_stack(&path).unwrap();
        assert_eq!(stack.channels(), 1);

        let path4 = tmp.0.join("c.npy");
        write_npy(&path4, &Array4::<u16>::ones((2, 3, 4, 2))).unwrap();
        assert_eq!(read_channel_stack(&path4).unwrap().channels(), 2);
        assert!(read_volume(&path4).is_err());
    }

    #[test]
    fn test_mask_from_npy_and_png() {
        let tmp = TempDir::new("mask");
        let raw = ndarray::array![[0u8, 3], [255, 0]];
        let npy = tmp.0.join("mask.npy");
        write_npy(&npy, &raw).unwrap();
        let mask = read_mask(&npy).unwrap();
        assert_eq!(mask.data(), ndarray::array![[false, true], [true, false]]);

        let png = tmp.0.join("mask.png");
        let mut gray = image::GrayImage::new(2, 2);
        gray.put_pixel(1, 0, image::Luma([9]));
        gray.put_pixel(0, 1, image::Luma([200]));
        gray.save(&png).unwrap();
        assert_eq!(read_mask(&png).unwrap(), mask);
    }

    #[test]
    fn test_cell_records_dir() {
        let tmp = TempDir::new("records");
        for id in [12, 3] {
            let record = CellRecord {
                cell_id: id,
                centroid: [1.0, 2.0],
                area: 5,
                dy_offset: -1,
                dx_offset: 0,
                ydim: 60,
                xdim: 61,
                rotation: Rotation::R270,
                normalised_marker_y_coord: None,
                normalised_marker_x_coord: None,
            };
            let path = write_cell_record(&tmp.0, &record).unwrap();
            assert!(path.ends_with(format!("cell-{id:05}.json")));
        }
        fs::write(tmp.0.join("notes.txt"), "ignored").unwrap();
        let records = read_cell_records(&tmp.0).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.cell_id).collect();
        assert_eq!(ids, vec![3, 12]);
    }
}
