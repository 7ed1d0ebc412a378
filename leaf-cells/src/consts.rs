//! 通用常量.

/// 分割结果中背景 (未标记) 像素的标签值.
pub const BACKGROUND: u32 = 0;

/// 表面提取的默认百分位数.
pub const DEFAULT_SURFACE_PERCENTILE: f64 = 95.0;

/// 细胞截图相关的默认几何参数.
pub mod crop {
    /// 导出截图前对细胞区域的膨胀次数.
    pub const DILATION: usize = 20;

    /// 截图四周的填充宽度 (像素).
    pub const PAD: usize = 25;

    /// 截图的最近邻放大倍数.
    pub const SCALE: usize = 3;
}

/// 细胞记录 JSON 中用户点击坐标的键名.
pub mod keys {
    /// 归一化的标记物 y 坐标.
    pub const MARKER_Y: &str = "normalised_marker_y_coord";

    /// 归一化的标记物 x 坐标.
    pub const MARKER_X: &str = "normalised_marker_x_coord";

    /// 旧版本使用的 y 坐标键名.
    pub const LEGACY_Y: &str = "clicked_y";

    /// 旧版本使用的 x 坐标键名.
    pub const LEGACY_X: &str = "clicked_x";
}

/// 张量 CSV 的表头.
pub const TENSOR_CSV_HEADER: &str = "id,mx,my,cx,cy";
