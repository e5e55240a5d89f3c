use thiserror::Error;

/// 张量运算中不可恢复的形状错误（以 panic 信息的形式出现）
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    #[error("数据长度 {data_len} 与形状 {shape:?} 不一致")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },

    #[error(
        "形状不一致，故无法{operator}：第一个张量的形状为{tensor1_shape:?}，第二个张量的形状为{tensor2_shape:?}"
    )]
    OperatorError {
        operator: Operator,
        tensor1_shape: Vec<usize>,
        tensor2_shape: Vec<usize>,
    },

    #[error("张量形状不兼容")]
    IncompatibleShape,

    #[error("该操作只支持 {expected} 维张量，得到 {got} 维")]
    DimensionNotSupported { expected: usize, got: usize },
}

/// 张量的二元运算符
#[derive(Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    MatMul,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operation_name = match self {
            Self::Add => "相加",
            Self::Sub => "相减",
            Self::Mul => "相乘",
            Self::Div => "相除",
            Self::MatMul => "矩阵相乘",
        };
        write!(f, "{operation_name}")
    }
}
