//! 运行时错误.

use crate::config::ConfigError;
use crate::data::ShapeError;
use crate::geometry::RotationError;

/// 本 crate 所有可恢复错误的汇总.
#[derive(Debug, thiserror::Error)]
pub enum LeafError {
    /// 参数缺失或非法.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 输入数组的维度/形状不符合约定.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// 旋转角度不是直角.
    #[error(transparent)]
    Rotation(#[from] RotationError),

    /// 细胞记录 JSON 读写失败.
    #[error("cell record json error: {0}")]
    Json(#[from] serde_json::Error),

    /// `.npy` 读取失败.
    #[error("npy read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// `.npy` 写入失败.
    #[error("npy write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// 图像解码失败.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// 其它 I/O 错误.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 本 crate 的通用返回值.
pub type LeafResult<T> = Result<T, LeafError>;
