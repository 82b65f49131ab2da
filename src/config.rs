use crate::error::{BlocksError, Result};
use serde::{Deserialize, Serialize};

fn default_forget_bias() -> f64 {
    1.0
}

fn default_init_range() -> f64 {
    0.1
}

/// 双向 LSTM 编码器的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// 每个方向的隐藏层大小
    pub hidden_dim: usize,
    /// 加到遗忘门预激活上的偏置
    #[serde(default = "default_forget_bias")]
    pub forget_bias: f64,
    /// 权重从 Uniform(-init_range, init_range) 采样，偏置为零
    #[serde(default = "default_init_range")]
    pub init_range: f64,
    /// 固定随机种子，`None` 时使用系统熵
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EncoderConfig {
    pub fn new(hidden_dim: usize) -> Self {
        Self {
            hidden_dim,
            forget_bias: default_forget_bias(),
            init_range: default_init_range(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_forget_bias(mut self, forget_bias: f64) -> Self {
        self.forget_bias = forget_bias;
        self
    }

    pub fn with_init_range(mut self, init_range: f64) -> Self {
        self.init_range = init_range;
        self
    }

    /// 检查配置能否用于初始化参数。
    ///
    /// `init_range` 必须是非负有限数，且 `2 * init_range` 不溢出（采样区间宽度）；
    /// `forget_bias` 必须是有限数。
    pub fn validate(&self) -> Result<()> {
        if !(self.init_range.is_finite() && self.init_range >= 0.0)
            || !(2.0 * self.init_range).is_finite()
        {
            return Err(BlocksError::InvalidConfig(format!(
                "init_range must be finite, non-negative and at most f64::MAX / 2, got {}",
                self.init_range
            )));
        }
        if !self.forget_bias.is_finite() {
            return Err(BlocksError::InvalidConfig(format!(
                "forget_bias must be finite, got {}",
                self.forget_bias
            )));
        }
        Ok(())
    }
}
