use crate::config::EncoderConfig;
use crate::layers::lstm_cell::LstmCell;
use ndarray::{s, Array1, Array2, Array3};
use ndarray_rand::rand::Rng;

/// LSTM 的最终状态，形状均为 [batch, hidden_size]
#[derive(Debug, Clone, PartialEq)]
pub struct LstmState {
    pub c: Array2<f64>,
    pub h: Array2<f64>,
}

impl LstmState {
    pub fn zeros(batch_size: usize, hidden_size: usize) -> Self {
        Self {
            c: Array2::zeros((batch_size, hidden_size)),
            h: Array2::zeros((batch_size, hidden_size)),
        }
    }
}

/// LSTM 层，按每个样本的真实长度动态展开
#[derive(Debug)]
pub struct LstmLayer {
    pub cell: LstmCell,
    pub hidden_size: usize,
}

impl LstmLayer {
    pub fn new<R: Rng + ?Sized>(input_size: usize, config: &EncoderConfig, rng: &mut R) -> Self {
        Self {
            cell: LstmCell::new(input_size, config, rng),
            hidden_size: config.hidden_dim,
        }
    }

    /// 批处理序列前向传播
    /// 输入 xs: [batch, seq_len, input_dim]，lengths: [batch]
    /// 返回 hs: [batch, seq_len, hidden_size] 以及每个样本在其最后有效时间步的状态
    ///
    /// 对样本 b，`t >= lengths[b]` 的时间步输出为零，状态原样向后传递。
    /// 只展开到批内最大长度为止。
    pub fn forward_dynamic(
        &self,
        xs: &Array3<f64>,
        lengths: &Array1<usize>,
    ) -> (Array3<f64>, LstmState) {
        let (batch_size, seq_len, _input_dim) = xs.dim();
        let steps = lengths.iter().copied().max().unwrap_or(0).min(seq_len);
        let mut hs = Array3::zeros((batch_size, seq_len, self.hidden_size));
        let mut state = LstmState::zeros(batch_size, self.hidden_size);
        for t in 0..steps {
            let x_t = xs.slice(s![.., t, ..]);
            let (mut h_t, mut c_t) =
                self.cell.forward_batch(&x_t, &state.h.view(), &state.c.view());
            for (b, &length) in lengths.iter().enumerate() {
                if t < length {
                    hs.slice_mut(s![b, t, ..]).assign(&h_t.row(b));
                } else {
                    h_t.row_mut(b).assign(&state.h.row(b));
                    c_t.row_mut(b).assign(&state.c.row(b));
                }
            }
            state = LstmState { c: c_t, h: h_t };
        }
        (hs, state)
    }
}
