use crate::error::{BlocksError, Result};
use ndarray::{Array3, Axis};

/// 只在有效（非填充）位置上沿时间轴（axis 1）做 softmax。
///
/// # Arguments
///
/// * `scores` - [batch, max_len, k]
/// * `mask` - 可广播到 `scores` 的掩码，通常为 `sequence_length_and_mask` 给出的 [batch, max_len, 1]
///
/// 先减去每个样本沿时间轴的最大值保证数值稳定，取指数后乘以掩码，再除以掩码后的和。
/// 填充位置的结果恰好为 0。某个样本全部被掩掉时分母为 0，该样本的结果为 NaN。
pub fn masked_softmax(scores: &Array3<f64>, mask: &Array3<f64>) -> Result<Array3<f64>> {
    let mask = mask
        .broadcast(scores.raw_dim())
        .ok_or_else(|| BlocksError::shape_mismatch("mask", scores.shape(), mask.shape()))?;

    let max = scores
        .fold_axis(Axis(1), f64::NEG_INFINITY, |&a, &b| a.max(b))
        .insert_axis(Axis(1));
    let numerator = (scores - &max).mapv(f64::exp) * &mask;
    let denominator = numerator.sum_axis(Axis(1)).insert_axis(Axis(1));
    Ok(numerator / &denominator)
}
