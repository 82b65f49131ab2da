//! 可嵌入序列模型的数值工具：
//!
//! - 从零填充批次求真实长度与掩码
//! - 按真实长度动态展开的双向 LSTM 编码器
//! - 取每个样本最后一个有效时间步的输出
//! - 只在有效位置上归一化的 softmax

pub mod activations;
pub mod config;
pub mod error;
pub mod layers;
pub mod sequence;

pub use config::EncoderConfig;
pub use error::{BlocksError, Result};
pub use layers::bi_rnn_layer::{
    bidirectional_recurrent_encode, bidirectional_recurrent_encode_with_config, BiLstmEncoder,
    BiLstmOutput, ConcatMerge, MergeStrategy,
};
pub use layers::lstm_layer::LstmState;
pub use layers::scope::ParamScope;
pub use sequence::gather::{last_valid_output, last_valid_output_one_hot};
pub use sequence::length::{sequence_length_and_mask, token_length_and_mask};
pub use sequence::softmax::masked_softmax;
