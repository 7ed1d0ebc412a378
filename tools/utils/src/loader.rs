//! 对 `leaf-cells::io` 的更一层封装. 约定了工具之间共享的目录结构:
//!
//! ```text
//! <leaf_dir>/
//! ├── annotated-cells/
//! │   ├── cell-00001.json
//! │   ├── cell-00001-wall.png
//! │   └── cell-00001-marker.png
//! ├── surface.npy
//! ├── wall-projection.npy
//! ├── marker-projection.npy
//! ├── segmentation.npy
//! ├── tensors.csv
//! └── tensors-random.csv
//! ```

use std::env;
use std::path::{Path, PathBuf};

use leaf_cells::{io, CellRecord, LeafResult, Parameters};

/// 参数文件路径的环境变量名.
pub const PARAMETERS_ENV: &str = "LEAF_PARAMETERS";

/// 存放细胞记录与截图的子目录名.
pub const ANNOTATED_CELLS: &str = "annotated-cells";

/// 获取参数文件路径.
///
/// 1. 若环境变量 `$LEAF_PARAMETERS` 非空, 则返回其值;
/// 2. 否则, 返回 `default`.
pub fn parameters_path_from_env_or<P: AsRef<Path>>(default: P) -> PathBuf {
    match env::var(PARAMETERS_ENV) {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => default.as_ref().to_path_buf(),
    }
}

/// 读取并校验参数文件.
pub fn load_parameters<P: AsRef<Path>>(path: P) -> LeafResult<Parameters> {
    let params = Parameters::from_file(path.as_ref())?;
    log::info!("parameters loaded from {}", path.as_ref().display());
    Ok(params)
}

/// `leaf_dir` 下的细胞记录目录.
#[inline]
pub fn annotated_cells_dir<P: AsRef<Path>>(leaf_dir: P) -> PathBuf {
    leaf_dir.as_ref().join(ANNOTATED_CELLS)
}

/// 读取 `leaf_dir` 下的全部细胞记录, 按文件名排序.
pub fn load_cell_records<P: AsRef<Path>>(leaf_dir: P) -> LeafResult<Vec<CellRecord>> {
    let dir = annotated_cells_dir(leaf_dir);
    let records = io::read_cell_records(&dir)?;
    log::info!("{} cell record(s) loaded from {}", records.len(), dir.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotated_cells_dir() {
        assert_eq!(
            annotated_cells_dir("/data/leaf-03"),
            PathBuf::from("/data/leaf-03/annotated-cells")
        );
    }
}
