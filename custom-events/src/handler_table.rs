//! 实例级监听器表（HandlerTable）
//!
//! 每个实例在构造时持有一张空表；仅由注册表的订阅路径追加监听器，
//! `raise` 只读取不修改。
//!
use crate::error::{EventError, EventResult};
use crate::listener::{Listener, Payload};
use dashmap::DashMap;
use std::fmt;

#[derive(Default)]
pub struct HandlerTable {
    listeners: DashMap<String, Vec<Listener>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加监听器，保持订阅顺序
    pub(crate) fn push(&self, event: &str, listener: Listener) {
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// 清空全部监听器，返回清空前的监听器总数
    pub(crate) fn reset(&self) -> usize {
        let dropped = self.listeners.iter().map(|e| e.value().len()).sum();
        self.listeners.clear();
        dropped
    }

    /// 按订阅顺序同步调用该事件的全部监听器
    ///
    /// - 无监听器（包括未声明或已委托的事件）时静默返回；
    /// - 任一监听器失败即停止，后续监听器不再调用。
    pub fn raise(&self, event: &str, payload: &Payload) -> EventResult<()> {
        // 先取快照再调用，避免监听器内再次订阅时持有分片锁
        let Some(listeners) = self.listeners.get(event).map(|l| l.clone()) else {
            tracing::trace!(event, "raise without listeners");
            return Ok(());
        };

        tracing::trace!(event, listeners = listeners.len(), "raise");

        for listener in listeners {
            listener(payload).map_err(|source| EventError::ListenerFailed {
                event: event.to_string(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map(|l| l.len()).unwrap_or(0)
    }

    /// 已有监听器的事件名（无序）
    pub fn event_names(&self) -> Vec<String> {
        self.listeners.iter().map(|e| e.key().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.iter().all(|e| e.value().is_empty())
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.listeners.iter() {
            map.entry(entry.key(), &entry.value().len());
        }
        map.finish()
    }
}
