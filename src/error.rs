//! 错误类型

use thiserror::Error;

/// 序列工具与编码器可能返回的错误。
#[derive(Debug, Error)]
pub enum BlocksError {
    /// 同一个参数作用域中重复注册了相同的名字。
    #[error("Name collision: parameter scope '{0}' is already registered")]
    NameCollision(String),

    /// 输入张量之间的形状不一致。
    #[error("Shape mismatch for {what}: expected {expected:?}, actual {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// 长度无法定位到合法的时间步。
    #[error("Invalid length {length} for example {index} (max_length {max_length})")]
    InvalidLength {
        index: usize,
        length: usize,
        max_length: usize,
    },

    /// 编码器配置无法用于初始化参数。
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl BlocksError {
    pub fn shape_mismatch(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BlocksError>;
