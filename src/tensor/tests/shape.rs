use crate::tensor::Tensor;

#[test]
fn test_reshape_and_flatten() {
    let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let b = a.reshape(&[3, 2]);
    assert_eq!(b.shape(), &[3, 2]);
    assert_eq!(b[[2, 1]], 6.0);
    assert_eq!(a.flatten().shape(), &[6]);
}

#[test]
#[should_panic]
fn test_reshape_wrong_size_panics() {
    let _ = Tensor::zeros(&[2, 3]).reshape(&[4, 2]);
}

#[test]
fn test_select_rows() {
    #[rustfmt::skip]
    let a = Tensor::new(&[
        0.0, 0.1,
        1.0, 1.1,
        2.0, 2.1,
    ], &[3, 1, 2]);
    let picked = a.select_rows(&[2, 0]);
    assert_eq!(picked.shape(), &[2, 1, 2]);
    assert_eq!(picked.to_vec(), vec![2.0, 2.1, 0.0, 0.1]);
}

#[test]
fn test_transpose() {
    let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let t = a.transpose();
    assert_eq!(t.shape(), &[3, 2]);
    assert_eq!(t.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_sum_to_shape_reverses_broadcast() {
    let g = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    assert_eq!(g.sum_to_shape(&[1, 3]).to_vec(), vec![5.0, 7.0, 9.0]);
    assert_eq!(g.sum_to_shape(&[1, 3]).shape(), &[1, 3]);
    assert_eq!(g.sum_to_shape(&[3]).to_vec(), vec![5.0, 7.0, 9.0]);
    assert_eq!(g.sum_to_shape(&[1, 1]).to_vec(), vec![21.0]);
    assert_eq!(g.sum_to_shape(&[2, 3]), g);
}

#[test]
fn test_argmax_rows() {
    #[rustfmt::skip]
    let a = Tensor::new(&[
        0.1, 0.7, 0.2,
        0.9, 0.0, 0.1,
        -1.0, -2.0, -0.5,
    ], &[3, 3]);
    assert_eq!(a.argmax_rows(), vec![1, 0, 2]);
}

#[test]
fn test_can_broadcast_with() {
    let a = Tensor::zeros(&[4, 3]);
    assert!(a.can_broadcast_with(&Tensor::zeros(&[1, 3])));
    assert!(a.can_broadcast_with(&Tensor::zeros(&[3])));
    assert!(a.can_broadcast_with(&Tensor::zeros(&[1, 1])));
    assert!(!a.can_broadcast_with(&Tensor::zeros(&[2, 3])));
}
