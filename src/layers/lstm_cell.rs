use crate::activations::functions::{Sigmoid, Tanh};
use crate::activations::traits::Activation;
use crate::config::EncoderConfig;
use ndarray::{s, Array1, Array2, ArrayView2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// LSTM 单元（批处理单步前向传播）
#[derive(Debug)]
pub struct LstmCell {
    pub w_f: Array2<f64>, // [hidden_size, input_size + hidden_size]
    pub w_i: Array2<f64>,
    pub w_c: Array2<f64>,
    pub w_o: Array2<f64>,
    pub b_f: Array1<f64>, // [hidden_size]
    pub b_i: Array1<f64>,
    pub b_c: Array1<f64>,
    pub b_o: Array1<f64>,
    pub forget_bias: f64,
    pub input_size: usize,
    pub hidden_size: usize,
    pub sigmoid: Sigmoid,
    pub tanh: Tanh,
}

impl LstmCell {
    /// 创建并初始化 LstmCell，权重从 rng 采样
    pub fn new<R: Rng + ?Sized>(input_size: usize, config: &EncoderConfig, rng: &mut R) -> Self {
        let hidden_size = config.hidden_dim;
        let k = input_size + hidden_size;
        let mut weight = || {
            if config.init_range > 0.0 {
                let dist = Uniform::new(-config.init_range, config.init_range);
                Array2::random_using((hidden_size, k), dist, &mut *rng)
            } else {
                Array2::zeros((hidden_size, k))
            }
        };
        Self {
            w_f: weight(),
            w_i: weight(),
            w_c: weight(),
            w_o: weight(),
            b_f: Array1::zeros(hidden_size),
            b_i: Array1::zeros(hidden_size),
            b_c: Array1::zeros(hidden_size),
            b_o: Array1::zeros(hidden_size),
            forget_bias: config.forget_bias,
            input_size,
            hidden_size,
            sigmoid: Sigmoid,
            tanh: Tanh,
        }
    }

    // [x_t, h_prev] · W^T + b，按列切分权重而不拼接输入
    fn gate(
        &self,
        w: &Array2<f64>,
        b: &Array1<f64>,
        x_t: &ArrayView2<f64>,
        h_prev: &ArrayView2<f64>,
    ) -> Array2<f64> {
        let w_x = w.slice(s![.., ..self.input_size]);
        let w_h = w.slice(s![.., self.input_size..]);
        x_t.dot(&w_x.t()) + h_prev.dot(&w_h.t()) + b
    }

    /// 批处理前向传播
    /// x_t: [batch, input_size]，h_prev/c_prev: [batch, hidden_size]
    /// 返回 (h_t, c_t)
    pub fn forward_batch(
        &self,
        x_t: &ArrayView2<f64>,
        h_prev: &ArrayView2<f64>,
        c_prev: &ArrayView2<f64>,
    ) -> (Array2<f64>, Array2<f64>) {
        let f_t = self
            .sigmoid
            .forward(&(self.gate(&self.w_f, &self.b_f, x_t, h_prev) + self.forget_bias));
        let i_t = self.sigmoid.forward(&self.gate(&self.w_i, &self.b_i, x_t, h_prev));
        let c_tilde = self.tanh.forward(&self.gate(&self.w_c, &self.b_c, x_t, h_prev));
        let o_t = self.sigmoid.forward(&self.gate(&self.w_o, &self.b_o, x_t, h_prev));
        let c_t = &f_t * c_prev + &i_t * &c_tilde;
        let h_t = &o_t * &self.tanh.forward(&c_t);
        (h_t, c_t)
    }
}
