//! 事件能力统一错误定义
//!
//! 三类错误均为编程期错误信号：在出错的调用点同步返回，不做重试或降级。
//! 另有 `ListenerFailed` 用于将监听器自身的失败从 `raise` 中传出。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventError {
    /// 已配置的类型未声明该事件名
    #[error(
        "unsupported event: event={event}, library={}",
        .library.as_deref().unwrap_or("<unnamed>")
    )]
    UnsupportedEvent {
        event: String,
        library: Option<String>,
    },

    /// 委托目标拒绝了订阅（目标的原始错误不向外暴露）
    #[error(
        "delegation failed: event={event}, from={}, to={}",
        .source_library.as_deref().unwrap_or("<unnamed>"),
        .target_library.as_deref().unwrap_or("<unnamed>")
    )]
    DelegationFailure {
        event: String,
        source_library: Option<String>,
        target_library: Option<String>,
    },

    /// 查询一个未声明委托的事件的委托目标
    #[error("event is not delegated: event={event}")]
    NotDelegated { event: String },

    /// 监听器执行失败，后续监听器不再调用
    #[error("listener failed: event={event}, reason={source}")]
    ListenerFailed {
        event: String,
        #[source]
        source: anyhow::Error,
    },
}

/// 统一 Result 类型别名
pub type EventResult<T> = Result<T, EventError>;
