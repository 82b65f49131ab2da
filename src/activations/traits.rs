use ndarray::Array2;

/// 定义激活函数的通用接口。
pub trait Activation {
    /// 对一个批次 [batch, dim] 逐元素执行前向计算。
    fn forward(&self, x: &Array2<f64>) -> Array2<f64>;
}
