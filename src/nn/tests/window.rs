/*
 * @Description  : 池化窗口几何（PoolGeometry）单元测试
 */

use crate::nn::GraphError;
use crate::nn::window::PoolGeometry;

#[test]
fn test_geometry_sizes() -> Result<(), GraphError> {
    let geometry = PoolGeometry::new("Test", &[3, 2, 6, 4], 2)?;
    assert_eq!((geometry.out_h(), geometry.out_w()), (3, 2));
    assert_eq!(geometry.window_len(), 4);
    assert_eq!(geometry.output_shape(), vec![3, 2, 3, 2]);
    assert_eq!(geometry.sample_len(), 2 * 6 * 4);
    assert_eq!(geometry.pooled_sample_len(), 2 * 3 * 2);
    Ok(())
}

#[test]
fn test_window_offsets_row_major() -> Result<(), GraphError> {
    let geometry = PoolGeometry::new("Test", &[1, 2, 4, 4], 2)?;
    // 通道 0，左上窗口
    assert_eq!(geometry.window_offsets(0, 0, 0), vec![0, 1, 4, 5]);
    // 通道 1，(oh=1, ow=0)：通道基址 16，起始行 2
    assert_eq!(geometry.window_offsets(1, 1, 0), vec![24, 25, 28, 29]);

    let geometry = PoolGeometry::new("Test", &[1, 1, 3, 3], 3)?;
    assert_eq!(geometry.window_offsets(0, 0, 0), (0..9).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_windows_cover_sample_exactly_once() -> Result<(), GraphError> {
    let geometry = PoolGeometry::new("Test", &[1, 3, 6, 6], 3)?;
    let mut seen = vec![0usize; geometry.sample_len()];
    let mut out_indices = Vec::new();
    for (out_idx, offsets) in geometry.windows() {
        assert_eq!(offsets.len(), geometry.window_len());
        out_indices.push(out_idx);
        for i in offsets {
            seen[i] += 1;
        }
    }
    assert!(seen.iter().all(|&count| count == 1));
    // 输出下标按 (c, oh, ow) 顺序递增
    assert_eq!(out_indices, (0..geometry.pooled_sample_len()).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_geometry_rejects_invalid_input() {
    assert!(matches!(
        PoolGeometry::new("Test", &[1, 4, 4], 2),
        Err(GraphError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        PoolGeometry::new("Test", &[1, 1, 4, 4], 0),
        Err(GraphError::InvalidConfiguration(_))
    ));
    // 28 不能被 3 整除：拒绝而不是截断
    assert!(matches!(
        PoolGeometry::new("Test", &[1, 1, 28, 28], 3),
        Err(GraphError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        PoolGeometry::new("Test", &[1, 1, 4, 6], 4),
        Err(GraphError::InvalidConfiguration(_))
    ));
}
