use ndarray::{Array1, Array2, Array3, Axis};

/// 计算零填充批次中每个样本的真实长度以及对应的掩码。
///
/// 输入 sequence: [batch, max_len, feature_dim]
/// 返回 lengths: [batch]，mask: [batch, max_len, 1]
///
/// 某个时间步的特征向量绝对值之和为零即视为填充。真实数据中若出现全零向量，
/// 同样会被当作填充计入掩码之外，调用方需要保证这种输入不会出现。
pub fn sequence_length_and_mask(sequence: &Array3<f64>) -> (Array1<usize>, Array3<f64>) {
    let populated = sequence
        .mapv(f64::abs)
        .sum_axis(Axis(2))
        .mapv(|s| if s > 0.0 { 1.0 } else { 0.0 });
    lengths_and_mask(populated)
}

/// 针对 [batch, max_len] 的 token id 矩阵计算真实长度与掩码，id 为 0 的位置视为填充。
///
/// 返回 lengths: [batch]，mask: [batch, max_len, 1]
pub fn token_length_and_mask(ids: &Array2<i64>) -> (Array1<usize>, Array3<f64>) {
    let populated = ids.mapv(|id| if id != 0 { 1.0 } else { 0.0 });
    lengths_and_mask(populated)
}

// populated: [batch, max_len]，取值为 0.0 或 1.0
fn lengths_and_mask(populated: Array2<f64>) -> (Array1<usize>, Array3<f64>) {
    let lengths = populated.map_axis(Axis(1), |row| row.iter().filter(|&&v| v > 0.0).count());
    let mask = populated.insert_axis(Axis(2));
    (lengths, mask)
}
