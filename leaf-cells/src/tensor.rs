//! 张量 CSV: 每个被标注的细胞一行, 给出标记物与质心在原图中的坐标.

use std::io::Write;

use itertools::Itertools;

use crate::consts::TENSOR_CSV_HEADER;
use crate::geometry::Rotation;
use crate::{CellRecord, LeafResult};

/// 映射点击坐标时如何处理截图的旋转.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RotationPolicy {
    /// 使用记录中的旋转角度.
    Recorded,

    /// 忽略记录中的旋转, 一律按 0 度处理. 用于随机对照.
    Ignore,
}

/// CSV 中的一行.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TensorRow {
    /// 从 1 开始的行号.
    pub id: usize,

    /// 标记物的原图坐标 `(y, x)`.
    pub marker: (i64, i64),

    /// 质心 `(y, x)`.
    pub centroid: (f64, f64),
}

impl TensorRow {
    /// `id,mx,my,cx,cy`.
    fn to_csv_line(self) -> String {
        let (my, mx) = self.marker;
        let (cy, cx) = self.centroid;
        format!("{},{mx},{my},{cx:?},{cy:?}", self.id)
    }
}

/// 按读入顺序为带有点击坐标的记录生成 CSV 行, 没有点击坐标的记录被跳过.
pub fn tensor_rows<'a, I>(records: I, policy: RotationPolicy) -> Vec<TensorRow>
where
    I: IntoIterator<Item = &'a CellRecord>,
{
    records
        .into_iter()
        .filter_map(|record| {
            let rotation = match policy {
                RotationPolicy::Recorded => record.rotation,
                RotationPolicy::Ignore => Rotation::R0,
            };
            Some((record.marker_point(rotation)?, record.centroid()))
        })
        .enumerate()
        .map(|(i, (marker, centroid))| TensorRow {
            id: i + 1,
            marker,
            centroid,
        })
        .collect()
}

/// 写出 CSV. 行之间以 `\n` 分隔, 最后一行之后没有换行.
pub fn write_tensor_csv<W: Write>(mut writer: W, rows: &[TensorRow]) -> LeafResult<()> {
    let body = std::iter::once(TENSOR_CSV_HEADER.to_string())
        .chain(rows.iter().map(|row| row.to_csv_line()))
        .join("\n");
    writer.write_all(body.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cell_id: u32, click: Option<(f64, f64)>) -> CellRecord {
        CellRecord {
            cell_id,
            centroid: [12.5, 40.0],
            area: 17,
            dy_offset: 3,
            dx_offset: 20,
            ydim: 10,
            xdim: 50,
            rotation: Rotation::R90,
            normalised_marker_y_coord: click.map(|c| c.0),
            normalised_marker_x_coord: click.map(|c| c.1),
        }
    }

    #[test]
    fn test_tensor_rows() {
        let records = vec![
            record(7, Some((0.0, 0.5))),
            record(8, None),
            record(9, Some((0.5, 1.0))),
        ];
        let rows = tensor_rows(&records, RotationPolicy::Recorded);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].marker, (8, 70));
        assert_eq!(rows[1].id, 2);
        assert_eq!(rows[1].marker, (13, 45));
        assert_eq!(rows[1].centroid, (12.5, 40.0));
    }

    #[test]
    fn test_ignore_rotation() {
        let records = vec![record(7, Some((0.0, 0.5)))];
        let rows = tensor_rows(&records, RotationPolicy::Ignore);
        // (-0.5, 0) 不旋转: y = 0 + 3, x = 25 + 20.
        assert_eq!(rows[0].marker, (3, 45));
    }

    #[test]
    fn test_write_tensor_csv() {
        let records = vec![record(7, Some((0.0, 0.5))), record(9, Some((0.5, 1.0)))];
        let rows = tensor_rows(&records, RotationPolicy::Recorded);
        let mut buf = Vec::new();
        write_tensor_csv(&mut buf, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "id,mx,my,cx,cy\n1,70,8,40.0,12.5\n2,45,13,40.0,12.5"
        );

        let mut buf = Vec::new();
        write_tensor_csv(&mut buf, &[]).unwrap();
        assert_eq!(buf, b"id,mx,my,cx,cy");
    }
}
