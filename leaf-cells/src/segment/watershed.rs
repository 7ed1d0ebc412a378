//! 带标记的分水岭 (priority flood).

use binary_heap_plus::BinaryHeap;
use ndarray::{Array2, ArrayView2};

use super::label::n4_positions;
use crate::consts::BACKGROUND;

/// 以 `elevation` 为地形, 从 `markers` 中的非背景像素出发淹没整幅图像.
///
/// # 注意
///
/// 1. 堆顶为 (高度, 入堆次序) 最小的像素, 高度相同时先入堆者先出, 结果是确定的.
/// 2. 每个像素在入堆时即获得把它加入堆的那个邻居的编号.
/// 3. 与任何标记都不连通的像素 (仅在没有标记时出现) 保持为背景.
///
/// `elevation` 与 `markers` 的形状必须相同, 否则程序 panic.
pub fn watershed(elevation: ArrayView2<'_, u16>, markers: ArrayView2<'_, u32>) -> Array2<u32> {
    assert_eq!(elevation.dim(), markers.dim(), "地形与标记的大小不一致");
    let frame = elevation.dim();
    let mut labels = markers.to_owned();

    // 堆顶的 (高度, 次序) 最小
    let mut heap: BinaryHeap<(u16, u64, (usize, usize)), _> = BinaryHeap::new_min();
    let mut age = 0u64;
    for (pos, &label) in markers.indexed_iter() {
        if label != BACKGROUND {
            heap.push((elevation[pos], age, pos));
            age += 1;
        }
    }

    while let Some((_, _, pos)) = heap.pop() {
        let label = labels[pos];
        for neigh in n4_positions(pos, frame) {
            if labels[neigh] == BACKGROUND {
                labels[neigh] = label;
                heap.push((elevation[neigh], age, neigh));
                age += 1;
            }
        }
    }
    labels
}
