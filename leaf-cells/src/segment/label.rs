//! 4-连通域的提取、标记与过滤.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2};

use crate::consts::BACKGROUND;
use crate::{Area2d, Areas2d, Idx2d};

/// `pos` 在大小为 `frame` 的图像内的 4-邻居.
#[inline]
pub(crate) fn n4_positions((h, w): Idx2d, frame: Idx2d) -> impl Iterator<Item = Idx2d> {
    [
        h.checked_sub(1).map(|h| (h, w)),
        (h + 1 < frame.0).then_some((h + 1, w)),
        w.checked_sub(1).map(|w| (h, w)),
        (w + 1 < frame.1).then_some((h, w + 1)),
    ]
    .into_iter()
    .flatten()
}

/// 按行优先顺序找出 `binary` 中所有 4-连通的前景区域.
///
/// 区域按其第一个像素 (行优先) 的先后排列.
pub fn connected_areas(binary: ArrayView2<'_, bool>) -> Areas2d {
    let frame = binary.dim();
    let mut visited = Array2::from_elem(frame, false);
    let mut ans = Areas2d::new();
    let mut bfs_q = VecDeque::with_capacity(16);

    for (pos, &fg) in binary.indexed_iter() {
        if !fg || visited[pos] {
            continue;
        }
        visited[pos] = true;
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(16);
        while let Some(cur_pos) = bfs_q.pop_front() {
            this_area.push(cur_pos);
            for neigh in n4_positions(cur_pos, frame) {
                if binary[neigh] && !visited[neigh] {
                    visited[neigh] = true;
                    bfs_q.push_back(neigh);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 标记 4-连通前景区域, 编号从 1 开始按行优先顺序分配, 背景为 0.
pub fn label_components(binary: ArrayView2<'_, bool>) -> Array2<u32> {
    let mut labels = Array2::from_elem(binary.dim(), BACKGROUND);
    for (i, area) in connected_areas(binary).into_iter().enumerate() {
        let id = i as u32 + 1;
        for pos in area {
            labels[pos] = id;
        }
    }
    labels
}

/// 把面积小于 `min_size` 的 4-连通前景区域置为背景.
pub fn remove_small_objects(binary: &mut Array2<bool>, min_size: usize) {
    for area in connected_areas(binary.view()) {
        if area.len() < min_size {
            for pos in area {
                binary[pos] = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_n4_positions() {
        let got: Vec<_> = n4_positions((0, 0), (3, 3)).collect();
        assert_eq!(got, vec![(1, 0), (0, 1)]);
        assert_eq!(n4_positions((1, 1), (3, 3)).count(), 4);
        assert_eq!(n4_positions((0, 0), (1, 1)).count(), 0);
    }

    #[test]
    fn test_label_components() {
        let binary = array![
            [true, true, false, true],
            [false, true, false, true],
            [true, false, false, false],
            [true, false, true, true],
        ];
        let labels = label_components(binary.view());
        assert_eq!(
            labels,
            array![[1, 1, 0, 2], [0, 1, 0, 2], [3, 0, 0, 0], [3, 0, 4, 4]]
        );
    }

    #[test]
    fn test_diagonal_is_not_connected() {
        let binary = array![[true, false], [false, true]];
        assert_eq!(connected_areas(binary.view()).len(), 2);
    }

    #[test]
    fn test_remove_small_objects() {
        let mut binary = array![
            [true, true, false, true],
            [false, true, false, false],
            [false, false, false, true],
        ];
        remove_small_objects(&mut binary, 2);
        assert_eq!(
            binary,
            array![
                [true, true, false, false],
                [false, true, false, false],
                [false, false, false, false],
            ]
        );
        let before = binary.clone();
        remove_small_objects(&mut binary, 0);
        assert_eq!(binary, before);
    }
}
