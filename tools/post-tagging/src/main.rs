//! 标注完成后的处理: 把用户在截图上的点击映射回原图, 生成张量 CSV.
//!
//! 用法: `post-tagging <leaf_dir> [--debug]`

use std::path::PathBuf;

use anyhow::{bail, ensure, Result};

mod runner;

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    args.retain(|a| a != "--debug");
    let [leaf_dir] = args.as_slice() else {
        bail!("usage: post-tagging <leaf_dir> [--debug]");
    };
    let leaf_dir = PathBuf::from(leaf_dir);
    ensure!(leaf_dir.is_dir(), "{} not a directory", leaf_dir.display());

    utils::init_logger(debug);
    let written = runner::run(&leaf_dir)?;
    utils::sep();
    for (path, rows) in written {
        println!("{}: {rows} row(s)", path.display());
    }
    Ok(())
}
