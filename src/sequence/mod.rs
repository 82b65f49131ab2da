//! 处理零填充批次的序列工具：真实长度与掩码、取最后有效输出、掩码 softmax。

pub mod gather;
pub mod length;
pub mod softmax;

use crate::error::{BlocksError, Result};
use ndarray::Array1;

/// 长度向量必须与批大小一致。
pub(crate) fn check_lengths(lengths: &Array1<usize>, batch_size: usize) -> Result<()> {
    if lengths.len() != batch_size {
        return Err(BlocksError::shape_mismatch(
            "lengths",
            &[batch_size],
            &[lengths.len()],
        ));
    }
    Ok(())
}
