//! 运行参数.
//!
//! 参数文件是一个扁平的 YAML 映射. 所有键都是必需的, 缺失时直接报错, 不会使用默认值.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::projection::ZWindow;

/// 参数缺失或非法.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 必需的参数不存在.
    #[error("missing required parameter `{0}`")]
    MissingKey(&'static str),

    /// 参数类型错误或取值超出范围.
    #[error("invalid value for parameter `{key}`: {reason}")]
    InvalidValue {
        /// 出错的参数名.
        key: &'static str,
        /// 原因.
        reason: String,
    },

    /// 参数文件不是合法的 YAML.
    #[error("malformed parameter file: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// 参数文件读写失败.
    #[error("parameter file io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 完整的分析参数.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// 细胞壁信号所在通道.
    pub wall_channel: usize,

    /// 标记物信号所在通道.
    pub marker_channel: usize,

    /// 表面提取使用的逐列百分位数.
    pub surface_percentile: f64,

    /// 细胞壁投影窗口: 表面以上层数.
    pub wall_zabove: i64,

    /// 细胞壁投影窗口: 表面以下层数.
    pub wall_zbelow: i64,

    /// 标记物投影窗口: 表面以上层数.
    pub marker_zabove: i64,

    /// 标记物投影窗口: 表面以下层数.
    pub marker_zbelow: i64,

    /// 细胞壁去噪的百分位数.
    pub wall_percentile_filter_percentile: f64,

    /// 细胞壁去噪的窗口边长.
    pub wall_percentile_filter_size: usize,

    /// 标记物去噪的百分位数.
    pub marker_percentile_filter_percentile: f64,

    /// 标记物去噪的窗口边长.
    pub marker_percentile_filter_size: usize,

    /// 自适应阈值的块大小, 必须为奇数.
    pub wall_threshold_adaptive_block_size: usize,

    /// 取反前去除的 (细胞内部) 小连通域面积下限.
    pub wall_remove_small_objects_in_cell_min_size: usize,

    /// 取反后去除的 (细胞壁缺口处) 小连通域面积下限.
    pub wall_remove_small_objects_in_wall_min_size: usize,
}

type RawParameters = BTreeMap<String, serde_yml::Value>;

/// 取出 `key` 对应的值并转换为 `T`.
fn lookup<T: DeserializeOwned>(raw: &RawParameters, key: &'static str) -> Result<T, ConfigError> {
    let value = raw.get(key).ok_or(ConfigError::MissingKey(key))?;
    serde_yml::from_value(value.clone()).map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}

#[inline]
fn check(ok: bool, key: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            reason: reason.to_string(),
        })
    }
}

impl Parameters {
    /// 从 YAML 字符串解析参数. 任何必需键缺失都会返回 [`ConfigError::MissingKey`].
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        let raw: Option<RawParameters> = serde_yml::from_str(s)?;
        let raw = raw.unwrap_or_default();

        macro_rules! take {
            ($($key: ident),* $(,)?) => {
                Self { $($key: lookup(&raw, stringify!($key))?),* }
            };
        }
        let params = take!(
            wall_channel,
            marker_channel,
            surface_percentile,
            wall_zabove,
            wall_zbelow,
            marker_zabove,
            marker_zbelow,
            wall_percentile_filter_percentile,
            wall_percentile_filter_size,
            marker_percentile_filter_percentile,
            marker_percentile_filter_size,
            wall_threshold_adaptive_block_size,
            wall_remove_small_objects_in_cell_min_size,
            wall_remove_small_objects_in_wall_min_size,
        );
        params.validate()?;
        Ok(params)
    }

    /// 读取 YAML 参数文件.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// 序列化为 YAML 字符串.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    /// 写入 YAML 参数文件.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// 检查各参数的取值范围.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let percentile = |p: f64| (0.0..=100.0).contains(&p);
        check(
            percentile(self.surface_percentile),
            "surface_percentile",
            "must lie in [0, 100]",
        )?;
        check(
            percentile(self.wall_percentile_filter_percentile),
            "wall_percentile_filter_percentile",
            "must lie in [0, 100]",
        )?;
        check(
            percentile(self.marker_percentile_filter_percentile),
            "marker_percentile_filter_percentile",
            "must lie in [0, 100]",
        )?;
        check(
            self.wall_percentile_filter_size >= 1,
            "wall_percentile_filter_size",
            "must be at least 1",
        )?;
        check(
            self.marker_percentile_filter_size >= 1,
            "marker_percentile_filter_size",
            "must be at least 1",
        )?;
        check(
            self.wall_threshold_adaptive_block_size % 2 == 1,
            "wall_threshold_adaptive_block_size",
            "must be an odd number",
        )
    }

    /// 细胞壁投影窗口.
    #[inline]
    pub fn wall_window(&self) -> ZWindow {
        ZWindow::new(self.wall_zabove, self.wall_zbelow)
    }

    /// 标记物投影窗口.
    #[inline]
    pub fn marker_window(&self) -> ZWindow {
        ZWindow::new(self.marker_zabove, self.marker_zbelow)
    }
}
