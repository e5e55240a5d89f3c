/*
 * @Description  : 本文件仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 */

use super::Tensor;

impl Tensor {
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的形状是否严格一致。如：[1, 4] 和 [4] 是不一致的
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 判断张量是否为标量（只有一个元素）
    pub fn is_scalar(&self) -> bool {
        self.size() == 1
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn get_data_number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 按行优先顺序返回底层数据切片
    ///
    /// # Panics
    /// 张量内存不连续时（本 crate 中构造的张量总是连续的）
    pub fn data_as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .unwrap_or_else(|| panic!("张量内存不连续，形状 {:?}", self.shape()))
    }

    /// 按行优先顺序拷贝出全部数据
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// 是否含有 NaN 或无穷值
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|x| !x.is_finite())
    }

    /// 判断张量是否可以与另一个张量按 NumPy 规则广播
    pub fn can_broadcast_with(&self, other: &Self) -> bool {
        let (a, b) = (self.shape(), other.shape());
        let len = a.len().max(b.len());
        (0..len).all(|i| {
            let da = if i < len - a.len() { 1 } else { a[i - (len - a.len())] };
            let db = if i < len - b.len() { 1 } else { b[i - (len - b.len())] };
            da == db || da == 1 || db == 1
        })
    }
}
