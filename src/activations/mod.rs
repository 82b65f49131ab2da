// 激活函数
pub mod functions;
pub mod traits;
