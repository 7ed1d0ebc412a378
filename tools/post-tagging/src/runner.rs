//! 程序运行函数.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use leaf_cells::tensor::{tensor_rows, write_tensor_csv, RotationPolicy};
use leaf_cells::LeafResult;
use utils::loader;

/// 输出文件及对应的旋转处理方式. 随机对照忽略截图的旋转.
const OUTPUTS: [(&str, RotationPolicy); 2] = [
    ("tensors.csv", RotationPolicy::Recorded),
    ("tensors-random.csv", RotationPolicy::Ignore),
];

/// 实际运行. 返回写出的文件及其行数.
pub fn run(leaf_dir: &Path) -> LeafResult<Vec<(PathBuf, usize)>> {
    let records = loader::load_cell_records(leaf_dir)?;
    let mut written = Vec::with_capacity(OUTPUTS.len());
    for (name, policy) in OUTPUTS {
        let rows = tensor_rows(&records, policy);
        let path = leaf_dir.join(name);
        let mut file = BufWriter::new(File::create(&path)?);
        write_tensor_csv(&mut file, &rows)?;
        file.flush()?;
        log::info!("{} row(s) written to {}", rows.len(), path.display());
        written.push((path, rows.len()));
    }
    Ok(written)
}
