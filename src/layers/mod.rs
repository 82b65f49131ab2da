// 神经网络层 (LSTM, 双向编码器)
pub mod bi_rnn_layer;
pub mod lstm_cell;
pub mod lstm_layer;
pub mod scope;
