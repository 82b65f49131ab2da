use crate::config::EncoderConfig;
use crate::error::{BlocksError, Result};
use crate::layers::lstm_layer::{LstmLayer, LstmState};
use crate::layers::scope::ParamScope;
use crate::sequence::check_lengths;
use ndarray::{s, Array1, Array3, ArrayView3, Axis};
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use tracing::debug;

/// 合并策略Trait，把前向和反向的隐藏状态序列合并成一个张量
pub trait MergeStrategy {
    fn merge(&self, forward: &ArrayView3<f64>, backward: &ArrayView3<f64>) -> Result<Array3<f64>>;
}

/// 沿特征维拼接：[batch, seq_len, 2 * hidden_size]
#[derive(Clone, Debug)]
pub struct ConcatMerge;

impl MergeStrategy for ConcatMerge {
    fn merge(&self, forward: &ArrayView3<f64>, backward: &ArrayView3<f64>) -> Result<Array3<f64>> {
        Ok(ndarray::concatenate(Axis(2), &[forward.view(), backward.view()])?)
    }
}

/// 双向编码的结果
#[derive(Debug, Clone)]
pub struct BiLstmOutput {
    /// (前向, 反向) 隐藏状态序列，均为 [batch, seq_len, hidden_size]，按原始时间顺序排列
    pub hidden_states: (Array3<f64>, Array3<f64>),
    /// (前向, 反向) 最终状态
    pub final_states: (LstmState, LstmState),
}

impl BiLstmOutput {
    pub fn merge<M: MergeStrategy>(&self, strategy: &M) -> Result<Array3<f64>> {
        strategy.merge(&self.hidden_states.0.view(), &self.hidden_states.1.view())
    }

    pub fn into_parts(self) -> ((Array3<f64>, Array3<f64>), (LstmState, LstmState)) {
        (self.hidden_states, self.final_states)
    }
}

/// 把每个样本的前 lengths[b] 个时间步逆序，填充部分保持原位。
pub fn reverse_within_length(xs: &Array3<f64>, lengths: &Array1<usize>) -> Array3<f64> {
    let seq_len = xs.dim().1;
    let mut reversed = xs.clone();
    for (b, &length) in lengths.iter().enumerate() {
        let length = length.min(seq_len);
        reversed
            .slice_mut(s![b, ..length, ..])
            .assign(&xs.slice(s![b, ..length;-1, ..]));
    }
    reversed
}

/// 双向 LSTM 编码器，自己持有前向和反向两组参数
#[derive(Debug)]
pub struct BiLstmEncoder {
    pub name: String,
    pub forward_layer: LstmLayer,
    pub backward_layer: LstmLayer,
    pub input_dim: usize,
    pub hidden_dim: usize,
}

impl BiLstmEncoder {
    /// 在 scope 中注册 name 及其 `forward{name}`/`backward{name}` 子作用域并初始化参数。
    ///
    /// 配置非法时返回 `InvalidConfig`，任一名字已存在时返回 `NameCollision`，两种情况下 scope 都不变。
    pub fn new(
        scope: &mut ParamScope,
        input_dim: usize,
        config: &EncoderConfig,
        name: &str,
    ) -> Result<Self> {
        config.validate()?;
        scope.claim_all(&[
            name.to_string(),
            forward_scope_name(name),
            backward_scope_name(name),
        ])?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(
            name,
            input_dim,
            hidden_dim = config.hidden_dim,
            seeded = config.seed.is_some(),
            "creating bidirectional LSTM encoder"
        );
        Ok(Self {
            name: name.to_string(),
            forward_layer: LstmLayer::new(input_dim, config, &mut rng),
            backward_layer: LstmLayer::new(input_dim, config, &mut rng),
            input_dim,
            hidden_dim: config.hidden_dim,
        })
    }

    pub fn forward_scope(&self) -> String {
        forward_scope_name(&self.name)
    }

    pub fn backward_scope(&self) -> String {
        backward_scope_name(&self.name)
    }

    /// 批处理前向传播，输入 shape [batch, seq_len, input_dim]，lengths: [batch]
    ///
    /// 反向方向先在每个样本的真实长度内逆序，编码后再逆序回原始时间顺序。
    pub fn encode(&self, inputs: &Array3<f64>, lengths: &Array1<usize>) -> Result<BiLstmOutput> {
        check_inputs(inputs, lengths, self.input_dim)?;
        let (batch_size, max_length, _) = inputs.dim();
        debug!(
            name = %self.name,
            batch_size,
            max_length,
            steps = lengths.iter().copied().max().unwrap_or(0),
            "encoding batch"
        );

        let (forward_hs, forward_state) = self.forward_layer.forward_dynamic(inputs, lengths);
        let reversed = reverse_within_length(inputs, lengths);
        let (backward_hs_rev, backward_state) =
            self.backward_layer.forward_dynamic(&reversed, lengths);
        let backward_hs = reverse_within_length(&backward_hs_rev, lengths);

        Ok(BiLstmOutput {
            hidden_states: (forward_hs, backward_hs),
            final_states: (forward_state, backward_state),
        })
    }
}

fn forward_scope_name(name: &str) -> String {
    format!("forward{name}")
}

fn backward_scope_name(name: &str) -> String {
    format!("backward{name}")
}

/// inputs 的特征维、lengths 的个数以及每个长度都必须与批次一致。
fn check_inputs(inputs: &Array3<f64>, lengths: &Array1<usize>, input_dim: usize) -> Result<()> {
    let (batch_size, max_length, actual_dim) = inputs.dim();
    if actual_dim != input_dim {
        return Err(BlocksError::shape_mismatch(
            "inputs",
            &[batch_size, max_length, input_dim],
            inputs.shape(),
        ));
    }
    check_lengths(lengths, batch_size)?;
    if let Some((index, &length)) = lengths.iter().enumerate().find(|&(_, &l)| l > max_length) {
        return Err(BlocksError::InvalidLength {
            index,
            length,
            max_length,
        });
    }
    Ok(())
}

/// 首次调用时按 `inputs` 的特征维创建编码器并编码一次。
///
/// 输入在注册名字之前检查，出错时 scope 不变。
/// 同一个 scope 中用相同的 name 调用两次会返回 `NameCollision`；
/// 需要复用参数时请直接持有 `BiLstmEncoder` 并多次调用 `encode`。
pub fn bidirectional_recurrent_encode(
    scope: &mut ParamScope,
    inputs: &Array3<f64>,
    hidden_dim: usize,
    lengths: &Array1<usize>,
    name: &str,
) -> Result<BiLstmOutput> {
    let config = EncoderConfig::new(hidden_dim);
    bidirectional_recurrent_encode_with_config(scope, inputs, &config, lengths, name)
}

pub fn bidirectional_recurrent_encode_with_config(
    scope: &mut ParamScope,
    inputs: &Array3<f64>,
    config: &EncoderConfig,
    lengths: &Array1<usize>,
    name: &str,
) -> Result<BiLstmOutput> {
    let input_dim = inputs.dim().2;
    check_inputs(inputs, lengths, input_dim)?;
    let encoder = BiLstmEncoder::new(scope, input_dim, config, name)?;
    encoder.encode(inputs, lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::gather::last_valid_output;
    use crate::sequence::length::sequence_length_and_mask;
    use ndarray::{arr1, arr2, ArrayView1};

    fn assert_close(a: ArrayView1<f64>, b: ArrayView1<f64>) {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).for_each(|(x, y)| assert!((x - y).abs() < 1e-12));
    }

    fn signal_batch() -> Array3<f64> {
        // batch 0 长度 3，batch 1 长度 5
        let mut xs = Array3::<f64>::zeros((2, 5, 2));
        xs.slice_mut(s![0, ..3, ..])
            .assign(&arr2(&[[1.0, 0.0], [0.5, 0.5], [0.0, 1.0]]));
        xs.slice_mut(s![1, .., ..])
            .assign(&arr2(&[[0.0, 1.0], [0.2, 0.1], [0.5, 0.5], [0.3, -0.4], [1.0, 0.0]]));
        xs
    }

    #[test]
    fn test_encode_shapes_and_merge() {
        let mut scope = ParamScope::new();
        let xs = signal_batch();
        let (lengths, _mask) = sequence_length_and_mask(&xs);
        let output =
            bidirectional_recurrent_encode(&mut scope, &xs, 3, &lengths, "premise").unwrap();

        assert_eq!(output.hidden_states.0.shape(), &[2, 5, 3]);
        assert_eq!(output.hidden_states.1.shape(), &[2, 5, 3]);
        assert_eq!(output.final_states.0.c.shape(), &[2, 3]);
        assert_eq!(output.final_states.1.h.shape(), &[2, 3]);

        let merged = output.merge(&ConcatMerge).unwrap();
        assert_eq!(merged.shape(), &[2, 5, 6]);
        assert_eq!(merged.slice(s![.., .., ..3]), output.hidden_states.0);
        assert_eq!(merged.slice(s![.., .., 3..]), output.hidden_states.1);

        let ((forward_hs, backward_hs), (forward_state, _)) = output.into_parts();
        assert_eq!(merged.slice(s![.., .., ..3]), forward_hs);
        assert_eq!(merged.slice(s![.., .., 3..]), backward_hs);
        assert_eq!(forward_state.h.row(1), forward_hs.slice(s![1, 4, ..]));
    }

    #[test]
    fn test_same_name_twice_collides() {
        let mut scope = ParamScope::new();
        let xs = signal_batch();
        let lengths = arr1(&[3, 5]);
        bidirectional_recurrent_encode(&mut scope, &xs, 4, &lengths, "encoder").unwrap();
        let err =
            bidirectional_recurrent_encode(&mut scope, &xs, 4, &lengths, "encoder").unwrap_err();
        assert!(matches!(err, BlocksError::NameCollision(ref n) if n == "encoder"));

        // 不同名字可以共存
        assert!(bidirectional_recurrent_encode(&mut scope, &xs, 4, &lengths, "encoder_2").is_ok());
    }

    #[test]
    fn test_encoder_registers_direction_scopes() {
        let mut scope = ParamScope::new();
        let encoder = BiLstmEncoder::new(&mut scope, 2, &EncoderConfig::new(3), "enc").unwrap();
        assert!(scope.contains("enc"));
        assert!(scope.contains(&encoder.forward_scope()));
        assert!(scope.contains(&encoder.backward_scope()));
        assert_eq!(scope.len(), 3);

        // 与已注册的方向子作用域同名也算冲突，且不会留下部分注册
        let err = BiLstmEncoder::new(&mut scope, 2, &EncoderConfig::new(3), "forwardenc");
        assert!(matches!(err, Err(BlocksError::NameCollision(ref n)) if n == "forwardenc"));
        assert_eq!(scope.len(), 3);
        assert!(!scope.contains("backwardforwardenc"));
    }

    #[test]
    fn test_failed_encode_leaves_name_free() {
        let mut scope = ParamScope::new();
        let xs = Array3::<f64>::ones((2, 3, 2));

        let err =
            bidirectional_recurrent_encode(&mut scope, &xs, 2, &arr1(&[3]), "enc").unwrap_err();
        assert!(matches!(err, BlocksError::ShapeMismatch { what: "lengths", .. }));
        let err =
            bidirectional_recurrent_encode(&mut scope, &xs, 2, &arr1(&[3, 4]), "enc").unwrap_err();
        assert!(matches!(err, BlocksError::InvalidLength { index: 1, .. }));
        assert!(scope.is_empty());

        let output = bidirectional_recurrent_encode(&mut scope, &xs, 2, &arr1(&[3, 3]), "enc");
        assert!(output.is_ok());
        assert!(scope.contains("enc"));
    }

    #[test]
    fn test_invalid_config_leaves_name_free() {
        let mut scope = ParamScope::new();
        let config: EncoderConfig =
            serde_json::from_str(r#"{"hidden_dim": 2, "init_range": 1e308}"#).unwrap();
        let err = BiLstmEncoder::new(&mut scope, 2, &config, "enc").unwrap_err();
        assert!(matches!(err, BlocksError::InvalidConfig(_)));
        assert!(scope.is_empty());

        let xs = signal_batch();
        let err = bidirectional_recurrent_encode_with_config(
            &mut scope,
            &xs,
            &EncoderConfig::new(2).with_init_range(f64::NAN),
            &arr1(&[3, 5]),
            "enc",
        )
        .unwrap_err();
        assert!(matches!(err, BlocksError::InvalidConfig(_)));
        assert!(scope.is_empty());
    }

    #[test]
    fn test_padding_does_not_change_valid_outputs() {
        let mut scope = ParamScope::new();
        let config = EncoderConfig::new(3).with_seed(11);
        let encoder = BiLstmEncoder::new(&mut scope, 2, &config, "enc").unwrap();
        assert_eq!(encoder.forward_scope(), "forwardenc");
        assert_eq!(encoder.backward_scope(), "backwardenc");

        let padded = signal_batch();
        let padded_out = encoder.encode(&padded, &arr1(&[3, 5])).unwrap();

        let unpadded = padded.slice(s![0..1, ..3, ..]).to_owned();
        let unpadded_out = encoder.encode(&unpadded, &arr1(&[3])).unwrap();

        for (p, u) in [
            (&padded_out.hidden_states.0, &unpadded_out.hidden_states.0),
            (&padded_out.hidden_states.1, &unpadded_out.hidden_states.1),
        ] {
            p.slice(s![0, ..3, ..])
                .iter()
                .zip(u.slice(s![0, .., ..]).iter())
                .for_each(|(a, b)| assert!((a - b).abs() < 1e-12));
            assert!(p.slice(s![0, 3.., ..]).iter().all(|&v| v == 0.0));
        }

        let (padded_fw, padded_bw) = &padded_out.final_states;
        let (unpadded_fw, unpadded_bw) = &unpadded_out.final_states;
        assert_close(padded_fw.h.row(0), unpadded_fw.h.row(0));
        assert_close(padded_fw.c.row(0), unpadded_fw.c.row(0));
        assert_close(padded_bw.h.row(0), unpadded_bw.h.row(0));
        assert_close(padded_bw.c.row(0), unpadded_bw.c.row(0));
    }

    #[test]
    fn test_backward_direction_reads_from_the_end() {
        let mut scope = ParamScope::new();
        let config = EncoderConfig::new(2).with_seed(5);
        let encoder = BiLstmEncoder::new(&mut scope, 2, &config, "enc").unwrap();
        let xs = signal_batch();
        let lengths = arr1(&[3, 5]);
        let output = encoder.encode(&xs, &lengths).unwrap();

        // 反向方向在最后一个有效时间步只看到了一个输入
        let last_x = xs.slice(s![0..1, 2, ..]).to_owned();
        let zeros = ndarray::Array2::<f64>::zeros((1, 2));
        let (h, _c) = encoder
            .backward_layer
            .cell
            .forward_batch(&last_x.view(), &zeros.view(), &zeros.view());
        assert_close(output.hidden_states.1.slice(s![0, 2, ..]), h.row(0));

        // 反向最终状态对应原序列的第 0 个时间步
        assert_eq!(output.final_states.1.h.row(0), output.hidden_states.1.slice(s![0, 0, ..]));

        // 前向最终隐藏状态等于最后有效输出
        let last = last_valid_output(&output.hidden_states.0, &lengths).unwrap();
        assert_eq!(output.final_states.0.h, last);
    }

    #[test]
    fn test_seeded_encoders_are_reproducible() {
        let xs = signal_batch();
        let lengths = arr1(&[3, 5]);
        let config = EncoderConfig::new(3).with_seed(21);
        let encode = || {
            let mut scope = ParamScope::new();
            bidirectional_recurrent_encode_with_config(&mut scope, &xs, &config, &lengths, "a")
        };
        let a = encode().unwrap();
        let b = encode().unwrap();
        assert_eq!(a.hidden_states, b.hidden_states);
        assert_ne!(a.hidden_states.0, a.hidden_states.1);
    }

    #[test]
    fn test_encode_rejects_bad_inputs() {
        let mut scope = ParamScope::new();
        let encoder = BiLstmEncoder::new(&mut scope, 2, &EncoderConfig::new(3), "enc").unwrap();
        let xs = signal_batch();

        let err = encoder.encode(&xs, &arr1(&[3, 6])).unwrap_err();
        assert!(matches!(
            err,
            BlocksError::InvalidLength {
                index: 1,
                length: 6,
                max_length: 5
            }
        ));
        assert!(matches!(
            encoder.encode(&xs, &arr1(&[3])).unwrap_err(),
            BlocksError::ShapeMismatch { what: "lengths", .. }
        ));
        let wide = Array3::<f64>::ones((2, 5, 4));
        assert!(matches!(
            encoder.encode(&wide, &arr1(&[5, 5])).unwrap_err(),
            BlocksError::ShapeMismatch { what: "inputs", .. }
        ));
    }

    #[test]
    fn test_reverse_within_length() {
        let xs = Array3::from_shape_fn((2, 4, 1), |(b, t, _)| (b * 10 + t + 1) as f64);
        let reversed = reverse_within_length(&xs, &arr1(&[3, 4]));
        assert_eq!(reversed.slice(s![0, .., 0]), arr1(&[3.0, 2.0, 1.0, 4.0]));
        assert_eq!(reversed.slice(s![1, .., 0]), arr1(&[14.0, 13.0, 12.0, 11.0]));
        assert_eq!(reverse_within_length(&reversed, &arr1(&[3, 4])), xs);
    }
}
