//! 🌿欢迎光临🍃
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Point2d};

pub use crate::data::{ChannelStack, Mask, Projection, ShapeError, SurfaceMap, Volume, ZStackSource};

pub use crate::config::{ConfigError, Parameters};
pub use crate::error::{LeafError, LeafResult};

pub use crate::surface::surface_from_stack;

pub use crate::projection::{
    max_project, mean_project, percentile_filter, project, project_marker, project_wall,
    Aggregator, ZWindow,
};

pub use crate::segment::{build_seeds, segment_cells, Region, Segmentation};

pub use crate::geometry::{
    extract_crop, original_image_point, rotate, CropSpec, Rotation, RotationError, TransformChain,
};

pub use crate::pipeline::{analyse, export_cells, LeafAnalysis, RotationChoice};
pub use crate::record::CellRecord;
pub use crate::tensor::{tensor_rows, write_tensor_csv, RotationPolicy, TensorRow};

pub use crate::consts::crop::{DILATION, PAD, SCALE};
pub use crate::consts::{BACKGROUND, DEFAULT_SURFACE_PERCENTILE};
