//! 监听器（Listener）与事件载荷（Payload）
//!
use std::sync::Arc;

/// 事件载荷，无数据的事件携带 `Value::Null`
pub type Payload = serde_json::Value;

/// 事件监听器：接收一个载荷，失败时中断本次 `raise`
pub type Listener = Arc<dyn Fn(&Payload) -> anyhow::Result<()> + Send + Sync>;

/// 将闭包包装为 [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Payload) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}
