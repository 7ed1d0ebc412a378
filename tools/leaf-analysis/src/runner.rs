//! 程序运行函数.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use leaf_cells::geometry::{extract_crop, CropSpec};
use leaf_cells::pipeline::{analyse, export_cells, LeafAnalysis, RotationChoice};
use leaf_cells::{io, CellRecord, LeafResult, Parameters};
use utils::loader;

/// 一次运行的输入输出.
#[derive(Debug, Clone)]
pub struct Options {
    /// `(h, w, z)` 或 `(h, w, z, c)` 的 `.npy` z-stack.
    pub stack: PathBuf,

    /// 输出目录, 不存在时创建.
    pub output_dir: PathBuf,

    /// 可选的感兴趣区域掩码.
    pub mask: Option<PathBuf>,

    /// 截图旋转方式.
    pub rotation: RotationChoice,
}

/// `prefix` 后接 `-{suffix}.png`.
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!("-{suffix}.png"));
    PathBuf::from(name)
}

/// 写出中间结果: 表面, 两个投影, 分割.
fn write_intermediates(dir: &Path, leaf: &LeafAnalysis) -> LeafResult<()> {
    io::write_surface(dir.join("surface.npy"), &leaf.surface)?;
    io::write_projection(dir.join("wall-projection.npy"), &leaf.wall_projection)?;
    io::write_projection(dir.join("marker-projection.npy"), &leaf.marker_projection)?;
    io::write_labels(dir.join("segmentation.npy"), &leaf.cells)?;
    Ok(())
}

/// 写出一个细胞的记录及两个通道的截图.
fn write_cell(dir: &Path, leaf: &LeafAnalysis, spec: &CropSpec, record: &CellRecord) -> LeafResult<()> {
    io::write_cell_record(dir, record)?;
    let Some(region) = leaf.cells.region_by_identifier(record.cell_id) else {
        log::warn!("cell {} has no region", record.cell_id);
        return Ok(());
    };
    let prefix = io::cell_file_prefix(dir, record.cell_id);
    for (suffix, projection) in [("wall", &leaf.wall_projection), ("marker", &leaf.marker_projection)] {
        let (crop, _) = extract_crop(projection.data(), region, spec, record.rotation)?;
        io::save_png16(with_suffix(&prefix, suffix), crop.view())?;
    }
    Ok(())
}

/// 实际运行. 返回导出的细胞个数.
pub fn run(options: &Options, params: &Parameters) -> LeafResult<usize> {
    log::info!("analysing {}", options.stack.display());
    let source = io::read_channel_stack(&options.stack)?;
    let mask = options.mask.as_ref().map(io::read_mask).transpose()?;
    let leaf = analyse(&source, params, mask.as_ref())?;

    let out = options.output_dir.as_path();
    fs::create_dir_all(out)?;
    write_intermediates(out, &leaf)?;
    params.to_file(out.join("parameters.yml"))?;

    let cells_dir = loader::annotated_cells_dir(out);
    fs::create_dir_all(&cells_dir)?;
    let spec = CropSpec::default();
    let records = export_cells(&leaf.cells, &spec, options.rotation);
    for record in &records {
        write_cell(&cells_dir, &leaf, &spec, record)?;
    }
    log::info!("{} cell(s) written to {}", records.len(), cells_dir.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_suffix() {
        let prefix = Path::new("/out/annotated-cells/cell-00012");
        assert_eq!(
            with_suffix(prefix, "wall"),
            PathBuf::from("/out/annotated-cells/cell-00012-wall.png")
        );
    }
}
