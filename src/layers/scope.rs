use crate::error::{BlocksError, Result};
use std::collections::BTreeSet;
use tracing::trace;

/// 显式传递的参数作用域，记录已注册的编码器名字。
///
/// 每个编码器自己持有参数，作用域只负责防止同名编码器被重复创建。
#[derive(Debug, Default, Clone)]
pub struct ParamScope {
    names: BTreeSet<String>,
}

impl ParamScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个名字，已存在时返回 `NameCollision`
    pub fn claim(&mut self, name: &str) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            return Err(BlocksError::NameCollision(name.to_string()));
        }
        trace!(name, registered = self.names.len(), "claimed parameter scope");
        Ok(())
    }

    /// 一次注册多个名字：任一名字已存在（或列表内重复）时返回 `NameCollision`，且不注册任何名字
    pub fn claim_all(&mut self, names: &[String]) -> Result<()> {
        for (i, name) in names.iter().enumerate() {
            if self.names.contains(name) || names[..i].contains(name) {
                return Err(BlocksError::NameCollision(name.clone()));
            }
        }
        for name in names {
            self.claim(name)?;
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
