//! 事件源（EventSource）与可订阅对象（EventSubscribable）
//!
//! - `EventSubscribable`：任何可以接受订阅的对象，委托目标只需实现它；
//! - `EventSource`：持有 [`HandlerTable`] 的类型，通过全局注册表获得订阅与校验能力。
//!
use crate::error::EventResult;
use crate::handler_table::HandlerTable;
use crate::listener::{Listener, Payload};
use crate::registry::EventRegistry;

/// 可订阅对象
///
/// 委托目标不要求实现 [`EventSource`]，只需遵循同样的订阅约定。
pub trait EventSubscribable: Send + Sync {
    fn subscribe(&self, event: &str, listener: Listener) -> EventResult<()>;

    /// 用于错误信息的库名
    fn library_name(&self) -> Option<String> {
        None
    }
}

/// 事件源：类型级声明 + 实例级监听器表
///
/// 通常由 `#[event_source]` 宏实现，也可以手写：
///
/// ```
/// use custom_events::{EventSource, EventSubscribable, HandlerTable, listener};
///
/// struct Door {
///     handlers: HandlerTable,
/// }
///
/// impl EventSource for Door {
///     fn handlers(&self) -> &HandlerTable {
///         &self.handlers
///     }
/// }
///
/// let door = Door { handlers: HandlerTable::new() };
/// door.subscribe("on-open", listener(|_| Ok(()))).unwrap();
/// door.raise("on-open", serde_json::Value::Null).unwrap();
/// ```
pub trait EventSource: Send + Sync + Sized + 'static {
    /// 实例自身的监听器表
    fn handlers(&self) -> &HandlerTable;

    /// 触发事件，同步调用本实例上该事件的全部监听器
    fn raise(&self, event: &str, payload: Payload) -> EventResult<()> {
        self.handlers().raise(event, &payload)
    }

    fn is_supported(&self, event: &str) -> bool {
        EventRegistry::global().is_supported::<Self>(event)
    }

    fn is_delegated(&self, event: &str) -> bool {
        EventRegistry::global().is_delegated::<Self>(event)
    }
}

impl<T> EventSubscribable for T
where
    T: EventSource,
{
    fn subscribe(&self, event: &str, listener: Listener) -> EventResult<()> {
        EventRegistry::global().subscribe(self, event, listener)
    }

    fn library_name(&self) -> Option<String> {
        EventRegistry::global().library_name::<T>()
    }
}
