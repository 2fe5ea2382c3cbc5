//! 动态导出表
//!
//! 只增不减：键一旦发布就不会被移除或重新绑定。每个新模块实例化时，
//! 它的 `dynamic` 导入都必须已在表中。

use crate::error::LinkError;
use std::collections::HashMap;
use wasmtime::Extern;

#[derive(Default)]
pub struct ExportRegistry {
    entries: HashMap<String, Extern>,
    order: Vec<String>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发布一个导出；同名键已存在时拒绝
    pub fn publish(&mut self, name: impl Into<String>, item: Extern) -> Result<(), LinkError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(LinkError::DuplicateExport { name });
        }
        self.order.push(name.clone());
        self.entries.insert(name, item);
        Ok(())
    }

    /// 先检查整批，再全部发布，失败时表不变
    pub fn publish_all(&mut self, items: Vec<(String, Extern)>) -> Result<usize, LinkError> {
        for (index, (name, _)) in items.iter().enumerate() {
            let repeated = items[..index].iter().any(|(earlier, _)| earlier == name);
            if repeated || self.entries.contains_key(name) {
                return Err(LinkError::DuplicateExport { name: name.clone() });
            }
        }
        let count = items.len();
        for (name, item) in items {
            self.order.push(name.clone());
            self.entries.insert(name, item);
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&Extern> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按发布顺序
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl std::fmt::Debug for ExportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRegistry")
            .field("names", &self.order)
            .finish()
    }
}

/// 绑定名对应的导出键
pub fn global_key(id: i32) -> String {
    format!("global_{id}")
}
