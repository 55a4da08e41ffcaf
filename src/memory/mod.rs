use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// 运行期记忆 - 按作用域组织的键值存储，用于在任务之间传递产出
#[derive(Debug, Default)]
pub struct Memory {
    scopes: HashMap<String, HashMap<String, Value>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 存储数据到指定作用域和键
    pub fn store<T>(&mut self, scope: &str, key: &str, data: T) -> Result<()>
    where
        T: Serialize,
    {
        let serialized = serde_json::to_value(data)?;
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), serialized);
        Ok(())
    }

    /// 从指定作用域和键获取数据
    pub fn get<T>(&self, scope: &str, key: &str) -> Option<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        self.scopes
            .get(scope)
            .and_then(|entries| entries.get(key))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// 检查是否存在指定数据
    pub fn has_data(&self, scope: &str, key: &str) -> bool {
        self.scopes
            .get(scope)
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// 列出指定作用域的所有键
    pub fn list_keys(&self, scope: &str) -> Vec<String> {
        self.scopes
            .get(scope)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// 清空指定作用域
    pub fn clear_scope(&mut self, scope: &str) {
        self.scopes.remove(scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_get() {
        let mut memory = Memory::new();
        memory.store("run", "research", "raw findings").unwrap();

        let value: Option<String> = memory.get("run", "research");
        assert_eq!(value, Some("raw findings".to_string()));
    }

    #[test]
    fn test_get_missing() {
        let memory = Memory::new();
        let value: Option<String> = memory.get("run", "missing");
        assert!(value.is_none());
    }

    #[test]
    fn test_scopes_are_isolated() {
        let mut memory = Memory::new();
        memory.store("a", "key", 1u32).unwrap();
        memory.store("b", "key", 2u32).unwrap();

        assert_eq!(memory.get::<u32>("a", "key"), Some(1));
        assert_eq!(memory.get::<u32>("b", "key"), Some(2));
    }

    #[test]
    fn test_has_data_and_list_keys() {
        let mut memory = Memory::new();
        assert!(!memory.has_data("run", "research"));

        memory.store("run", "research", "x").unwrap();
        memory.store("run", "analysis", "y").unwrap();

        assert!(memory.has_data("run", "research"));
        let mut keys = memory.list_keys("run");
        keys.sort();
        assert_eq!(keys, vec!["analysis", "research"]);
    }

    #[test]
    fn test_clear_scope() {
        let mut memory = Memory::new();
        memory.store("run", "research", "x").unwrap();
        memory.clear_scope("run");
        assert!(!memory.has_data("run", "research"));
    }
}
