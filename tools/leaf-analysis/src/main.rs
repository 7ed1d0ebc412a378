//! 叶片分析: 读取 z-stack, 分割细胞, 导出细胞截图与记录.
//!
//! 用法:
//!
//! ```text
//! leaf-analysis <stack.npy> <output_dir> [--mask <path>] [--rotation <deg> | --seed <n>] [--debug]
//! ```
//!
//! 参数文件取自 `$LEAF_PARAMETERS`, 未设置时为当前目录下的 `parameters.yml`.

use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use leaf_cells::pipeline::RotationChoice;
use leaf_cells::Rotation;
use utils::loader;

mod runner;

const USAGE: &str = "usage: leaf-analysis <stack.npy> <output_dir> \
                     [--mask <path>] [--rotation <deg> | --seed <n>] [--debug]";

fn parse_args() -> Result<(runner::Options, bool)> {
    let mut positional = Vec::new();
    let mut mask = None;
    let mut rotation = RotationChoice::Fixed(Rotation::R0);
    let mut debug = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" => debug = true,
            "--mask" => mask = Some(PathBuf::from(args.next().context(USAGE)?)),
            "--rotation" => {
                let degrees: i64 = args.next().context(USAGE)?.parse()?;
                rotation = RotationChoice::Fixed(Rotation::try_from(degrees)?);
            }
            "--seed" => {
                let seed: u64 = args.next().context(USAGE)?.parse()?;
                rotation = RotationChoice::Random { seed };
            }
            _ if arg.starts_with("--") => bail!("unknown option `{arg}`\n{}", USAGE),
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let [stack, output_dir]: [PathBuf; 2] = match positional.try_into() {
        Ok(p) => p,
        Err(_) => bail!(USAGE),
    };
    ensure!(stack.is_file(), "{} not a file", stack.display());
    if let Some(mask) = &mask {
        ensure!(mask.is_file(), "{} not a file", mask.display());
    }
    let options = runner::Options {
        stack,
        output_dir,
        mask,
        rotation,
    };
    Ok((options, debug))
}

fn main() -> Result<()> {
    let (options, debug) = parse_args()?;
    utils::init_logger(debug);

    let params_path = loader::parameters_path_from_env_or("parameters.yml");
    let params = loader::load_parameters(&params_path)
        .with_context(|| format!("cannot load {}", params_path.display()))?;
    log::debug!("{params:?}");

    let cells = runner::run(&options, &params)?;
    utils::sep();
    println!("{cells} cell(s) exported to {}", options.output_dir.display());
    Ok(())
}
