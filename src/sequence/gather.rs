use super::check_lengths;
use crate::error::{BlocksError, Result};
use ndarray::{Array1, Array2, Array3, Axis};

/// 取动态展开 RNN 输出中每个样本最后一个非填充时间步的向量。
///
/// # Arguments
///
/// * `output` - [batch, max_len, feature_dim]
/// * `lengths` - [batch]，通常来自 `sequence_length_and_mask`
///
/// # Returns
///
/// * [batch, feature_dim]，第 b 行为 `output[b, lengths[b] - 1, ..]`
///
/// 实现方式是把前两维展平为 [batch * max_len, feature_dim]，
/// 再按 `b * max_len + lengths[b] - 1` 做 gather。
/// 长度为 0 或超过 max_len 时返回 `InvalidLength`。
pub fn last_valid_output(output: &Array3<f64>, lengths: &Array1<usize>) -> Result<Array2<f64>> {
    let (batch_size, max_length, out_size) = output.dim();
    check_lengths(lengths, batch_size)?;

    let index = lengths
        .iter()
        .enumerate()
        .map(|(b, &length)| {
            if length == 0 || length > max_length {
                Err(BlocksError::InvalidLength {
                    index: b,
                    length,
                    max_length,
                })
            } else {
                Ok(b * max_length + length - 1)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let flat = output.to_shape((batch_size * max_length, out_size))?;
    Ok(flat.select(Axis(0), &index))
}

/// 用 one-hot 时间掩码相乘再沿时间轴求和的方式取最后有效输出。
///
/// 与 `last_valid_output` 不同，长度为 0 或越界的样本得到全零行，而不是错误。
pub fn last_valid_output_one_hot(
    output: &Array3<f64>,
    lengths: &Array1<usize>,
) -> Result<Array2<f64>> {
    let (batch_size, max_length, _) = output.dim();
    check_lengths(lengths, batch_size)?;

    let mut length_mask = Array3::<f64>::zeros((batch_size, max_length, 1));
    for (b, &length) in lengths.iter().enumerate() {
        if (1..=max_length).contains(&length) {
            length_mask[[b, length - 1, 0]] = 1.0;
        }
    }
    Ok((output * &length_mask).sum_axis(Axis(1)))
}
