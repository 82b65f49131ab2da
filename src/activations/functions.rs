use super::traits::Activation;
use ndarray::Array2;

/// 对数组中的每个元素应用 sigmoid 函数。
///
/// Sigmoid 定义为 `1 / (1 + exp(-x))`。
pub fn sigmoid(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

/// 对数组中的每个元素应用双曲正切 (tanh) 函数。
pub fn tanh(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(f64::tanh)
}

/// Tanh 激活函数的结构体实现。
#[derive(Clone, Debug)]
pub struct Tanh;

impl Activation for Tanh {
    fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        tanh(x)
    }
}

/// Sigmoid 激活函数的结构体实现。
#[derive(Clone, Debug)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        sigmoid(x)
    }
}
