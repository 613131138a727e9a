//! 受限的发布/订阅能力（custom-events）
//!
//! 为任意类型提供一组有限、可声明的事件：
//! - 类型级声明（`configure`）：允许哪些事件名，以及哪些事件委托给协作对象；
//! - 实例级监听器表（`HandlerTable`）：构造时为空，仅由订阅追加；
//! - 订阅（`EventSubscribable::subscribe`）：校验、委托或本地登记；
//! - 触发（`EventSource::raise`）：同步、按订阅顺序调用，监听器失败即中断。
//!
//! 典型用法：
//! 1. 使用 `#[event_source]` 为结构体注入监听器表；
//! 2. 启动时调用 `configure::<T>(...)` 声明允许的事件与库名；
//! 3. 外部代码订阅，实例在状态变化时 `raise`。
//!
//! ```
//! use custom_events::{AllowedEvents, EventSource, EventSubscribable, configure, listener};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[custom_events::event_source]
//! struct Thermostat {
//!     celsius: i32,
//! }
//!
//! configure::<Thermostat>(
//!     AllowedEvents::new().local("on-temperature-changed"),
//!     Some("Thermostat"),
//! );
//!
//! let thermostat = Thermostat { handlers: Default::default(), celsius: 20 };
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//! thermostat
//!     .subscribe(
//!         "on-temperature-changed",
//!         listener(move |_| {
//!             counter.fetch_add(1, Ordering::SeqCst);
//!             Ok(())
//!         }),
//!     )
//!     .unwrap();
//!
//! thermostat.raise("on-temperature-changed", json!({ "celsius": 21 })).unwrap();
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! assert!(thermostat.subscribe("on-explode", listener(|_| Ok(()))).is_err());
//! ```
//!
pub mod allowed_events;
pub mod error;
pub mod handler_table;
pub mod listener;
pub mod registry;
pub mod source;

pub use allowed_events::{AllowedEvent, AllowedEvents, DelegateTarget, Delegation};
pub use error::{EventError, EventResult};
pub use handler_table::HandlerTable;
pub use listener::{Listener, Payload, listener};
pub use registry::{EventRegistry, TypeConfig, attach, configure, raise, subscribe};
pub use source::{EventSource, EventSubscribable};

#[cfg(feature = "macros")]
pub use custom_events_macros::event_source;

// 允许在本 crate 内部通过 ::custom_events 进行自引用，
// 以便过程宏在本 crate 的测试中也能解析到 ::custom_events 路径。
extern crate self as custom_events;
