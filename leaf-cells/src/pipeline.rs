//! 完整的分析流程: 表面 -> 投影 -> 种子 -> 分水岭 -> 截图记录.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::{CropSpec, Rotation, TransformChain};
use crate::projection::{project_marker, project_wall};
use crate::segment::{seeds_from_params, segment_cells, Segmentation};
use crate::surface::surface_from_stack;
use crate::{CellRecord, LeafResult, Mask, Parameters, Projection, SurfaceMap, ZStackSource};

/// 一片叶子的分析结果.
#[derive(Debug, Clone)]
pub struct LeafAnalysis {
    /// 由细胞壁通道提取的表面.
    pub surface: SurfaceMap,

    /// 细胞壁投影.
    pub wall_projection: Projection,

    /// 标记物投影.
    pub marker_projection: Projection,

    /// 细胞分割.
    pub cells: Segmentation,
}

/// 对 `source` 运行完整的分析流程.
///
/// 表面由细胞壁通道提取, 两个通道都投影到同一个表面上. 给出 `mask` 时,
/// 与掩码外部有交集的细胞被整体剔除.
pub fn analyse<S: ZStackSource + ?Sized>(
    source: &S,
    params: &Parameters,
    mask: Option<&Mask>,
) -> LeafResult<LeafAnalysis> {
    params.validate()?;

    let wall_stack = source.zstack(params.wall_channel)?;
    let (h, w, z) = wall_stack.shape();
    log::info!("wall channel {}: {h}x{w}x{z}", params.wall_channel);

    let surface = surface_from_stack(&wall_stack, params.surface_percentile);
    log::info!("surface extracted at p = {}", params.surface_percentile);

    let wall_projection = project_wall(&wall_stack, &surface, params)?;
    drop(wall_stack);
    log::info!("wall projected");

    let marker_stack = source.zstack(params.marker_channel)?;
    let marker_projection = project_marker(&marker_stack, &surface, params)?;
    log::info!("marker channel {} projected", params.marker_channel);

    let seeds = seeds_from_params(&wall_projection, params)?;
    let cells = segment_cells(&wall_projection, &seeds, mask)?;
    log::info!("{} seed(s), {} cell(s) kept", seeds.len(), cells.len());

    Ok(LeafAnalysis {
        surface,
        wall_projection,
        marker_projection,
        cells,
    })
}

/// 截图旋转角度的选取方式.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RotationChoice {
    /// 所有截图使用同一个角度.
    Fixed(Rotation),

    /// 每个截图从四个直角中随机选取. 相同的种子给出相同的结果.
    Random {
        /// 随机数种子.
        seed: u64,
    },
}

/// 为每个细胞生成截图变换与记录, 按编号升序. 没有细胞时返回空表.
pub fn export_cells(
    cells: &Segmentation,
    spec: &CropSpec,
    choice: RotationChoice,
) -> Vec<CellRecord> {
    let mut rng = match choice {
        RotationChoice::Random { seed } => Some(StdRng::seed_from_u64(seed)),
        RotationChoice::Fixed(_) => None,
    };
    let records: Vec<_> = cells
        .regions()
        .map(|region| {
            let rotation = match (&mut rng, choice) {
                (Some(rng), _) => Rotation::ALL[rng.random_range(0..Rotation::ALL.len())],
                (None, RotationChoice::Fixed(r)) => r,
                (None, RotationChoice::Random { .. }) => Rotation::R0,
            };
            let chain = TransformChain::from_region(region, spec, rotation);
            CellRecord::new(region, &chain)
        })
        .collect();
    log::debug!("{} cell record(s) exported", records.len());
    records
}
