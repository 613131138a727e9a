//! 事件注册表（EventRegistry）
//!
//! 进程级的类型配置存储：以 `TypeId` 为键保存各类型的 [`TypeConfig`]，
//! 以类型擦除方式存放，读取时还原。订阅时依据配置完成校验、委托或本地登记。
//!
//! 规则：
//! - 类型未配置：任何事件名都接受并登记在本地，不做委托；
//! - 类型已配置且未声明该事件：`UnsupportedEvent`；
//! - 声明为委托：每次订阅都重新解析目标并转交，目标拒绝则统一包装为 `DelegationFailure`；
//!   委托链回到同一实例的同一事件（环）同样返回 `DelegationFailure`；
//! - 其余情况：按订阅顺序追加到实例自身的监听器表。
//!
use crate::allowed_events::{AllowedEvent, AllowedEvents, DelegateTarget, Delegation};
use crate::error::{EventError, EventResult};
use crate::listener::{Listener, Payload};
use crate::source::EventSource;
use bon::Builder;
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// 类型级配置：允许的事件表 + 库名（仅用于诊断信息）
#[derive(Builder)]
pub struct TypeConfig<T> {
    events: AllowedEvents<T>,
    #[builder(into)]
    library: Option<String>,
}

impl<T> TypeConfig<T> {
    pub fn events(&self) -> &AllowedEvents<T> {
        &self.events
    }

    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }
}

impl<T> fmt::Debug for TypeConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConfig")
            .field("events", &self.events)
            .field("library", &self.library)
            .finish()
    }
}

type AnyConfig = Arc<dyn Any + Send + Sync>;

static GLOBAL: OnceLock<EventRegistry> = OnceLock::new();

/// 正在委托中的 (类型, 实例地址, 事件名)
type DelegationKey = (TypeId, usize, String);

thread_local! {
    static IN_FLIGHT: RefCell<HashSet<DelegationKey>> = RefCell::new(HashSet::new());
}

/// 标记一次进行中的委托，离开作用域时移除；同一实例的同一事件重入时返回 `None`
struct DelegationGuard {
    key: DelegationKey,
}

impl DelegationGuard {
    fn enter<T: 'static>(instance: &T, event: &str) -> Option<Self> {
        let key = (
            TypeId::of::<T>(),
            instance as *const T as usize,
            event.to_string(),
        );
        let inserted = IN_FLIGHT.with(|set| set.borrow_mut().insert(key.clone()));
        inserted.then_some(Self { key })
    }
}

impl Drop for DelegationGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|set| {
            set.borrow_mut().remove(&self.key);
        });
    }
}

pub struct EventRegistry {
    configs: DashMap<TypeId, AnyConfig>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self {
            configs: DashMap::new(),
        }
    }
}

impl EventRegistry {
    /// 进程级注册表，`EventSource` 的默认实现均基于它
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::default)
    }

    /// 配置类型（重复调用会替换配置，已构造的实例立即生效）
    pub fn configure<T: EventSource>(&self, config: TypeConfig<T>) {
        tracing::debug!(
            source = type_name::<T>(),
            library = config.library(),
            events = config.events().len(),
            "configure event source"
        );
        self.configs.insert(TypeId::of::<T>(), Arc::new(config));
    }

    /// 读取类型配置，未配置时返回 `None`
    pub fn config<T: EventSource>(&self) -> Option<Arc<TypeConfig<T>>> {
        let any = self.configs.get(&TypeId::of::<T>()).map(|c| c.clone())?;
        // 键与值同为泛型 T，正常情况下这里的 downcast 永远不会失败
        any.downcast::<TypeConfig<T>>().ok()
    }

    pub fn is_configured<T: EventSource>(&self) -> bool {
        self.configs.contains_key(&TypeId::of::<T>())
    }

    pub fn library_name<T: EventSource>(&self) -> Option<String> {
        self.config::<T>()
            .and_then(|c| c.library().map(str::to_string))
    }

    /// 未配置的类型接受任意事件名
    pub fn is_supported<T: EventSource>(&self, event: &str) -> bool {
        match self.config::<T>() {
            Some(config) => config.events().contains(event),
            None => true,
        }
    }

    pub fn is_delegated<T: EventSource>(&self, event: &str) -> bool {
        self.config::<T>()
            .is_some_and(|c| matches!(c.events().get(event), Some(AllowedEvent::Delegated(_))))
    }

    /// 解析事件的委托目标
    ///
    /// 事件未声明委托时返回 `NotDelegated`；字段当前未设置时返回 `Ok(None)`。
    pub fn delegated_target<'a, T: EventSource>(
        &self,
        instance: &'a T,
        event: &str,
    ) -> EventResult<Option<DelegateTarget<'a>>> {
        let delegation = self
            .config::<T>()
            .and_then(|c| c.events().get(event).and_then(|e| e.delegation().cloned()))
            .ok_or_else(|| EventError::NotDelegated {
                event: event.to_string(),
            })?;

        Ok(delegation.resolve(instance))
    }

    /// 订阅事件
    pub fn subscribe<T: EventSource>(
        &self,
        instance: &T,
        event: &str,
        listener: Listener,
    ) -> EventResult<()> {
        let Some(config) = self.config::<T>() else {
            tracing::trace!(source = type_name::<T>(), event, "subscribe (unconfigured)");
            instance.handlers().push(event, listener);
            return Ok(());
        };

        match config.events().get(event) {
            None => Err(EventError::UnsupportedEvent {
                event: event.to_string(),
                library: config.library.clone(),
            }),
            Some(AllowedEvent::Local) => {
                tracing::trace!(source = type_name::<T>(), event, "subscribe");
                instance.handlers().push(event, listener);
                Ok(())
            }
            Some(AllowedEvent::Delegated(delegation)) => {
                Self::subscribe_delegated(&config, delegation, instance, event, listener)
            }
        }
    }

    fn subscribe_delegated<T: EventSource>(
        config: &TypeConfig<T>,
        delegation: &Delegation<T>,
        instance: &T,
        event: &str,
        listener: Listener,
    ) -> EventResult<()> {
        let Some(target) = delegation.resolve(instance) else {
            tracing::debug!(
                source = type_name::<T>(),
                event,
                field = delegation.field(),
                "delegation target is not set"
            );
            return Err(EventError::DelegationFailure {
                event: event.to_string(),
                source_library: config.library.clone(),
                target_library: None,
            });
        };

        // 委托环（A -> B -> A）回到同一实例时直接失败，不再继续递归
        let Some(_guard) = DelegationGuard::enter(instance, event) else {
            tracing::debug!(
                source = type_name::<T>(),
                event,
                "delegation cycle detected"
            );
            return Err(EventError::DelegationFailure {
                event: event.to_string(),
                source_library: config.library.clone(),
                target_library: target.library_name(),
            });
        };

        tracing::debug!(
            source = type_name::<T>(),
            event,
            field = delegation.field(),
            "delegate subscription"
        );

        target.subscribe(event, listener).map_err(|cause| {
            tracing::debug!(error = %cause, event, "delegation target rejected subscription");
            EventError::DelegationFailure {
                event: event.to_string(),
                source_library: config.library.clone(),
                target_library: target.library_name(),
            }
        })
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("configured_types", &self.configs.len())
            .finish()
    }
}

/// 配置类型允许的事件与库名
pub fn configure<T: EventSource>(events: AllowedEvents<T>, library: Option<&str>) {
    EventRegistry::global().configure(
        TypeConfig::builder()
            .events(events)
            .maybe_library(library)
            .build(),
    );
}

/// 重置实例的监听器表
///
/// 实例在构造时已持有空表；对已有监听器的实例再次调用会丢弃这些监听器。
pub fn attach<T: EventSource>(instance: &T) {
    let dropped = instance.handlers().reset();
    if dropped > 0 {
        tracing::warn!(
            source = type_name::<T>(),
            dropped,
            "handler table reset while listeners were attached"
        );
    }
}

/// 订阅事件（等价于 `EventSubscribable::subscribe`）
pub fn subscribe<T: EventSource>(instance: &T, event: &str, listener: Listener) -> EventResult<()> {
    EventRegistry::global().subscribe(instance, event, listener)
}

/// 触发事件（等价于 `EventSource::raise`）
pub fn raise<T: EventSource>(instance: &T, event: &str, payload: Payload) -> EventResult<()> {
    instance.raise(event, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_table::HandlerTable;
    use crate::listener::listener;
    use crate::source::EventSubscribable;
    use serde_json::json;
    use std::sync::Mutex;

    fn noop() -> Listener {
        listener(|_| Ok(()))
    }

    macro_rules! source_type {
        ($name:ident) => {
            #[derive(Default)]
            struct $name {
                handlers: HandlerTable,
            }

            impl EventSource for $name {
                fn handlers(&self) -> &HandlerTable {
                    &self.handlers
                }
            }
        };
    }

    source_type!(Unconfigured);
    source_type!(Reconfigured);
    source_type!(Library);

    #[test]
    fn unconfigured_type_is_permissive() {
        let registry = EventRegistry::default();
        let instance = Unconfigured::default();

        assert!(!registry.is_configured::<Unconfigured>());
        assert!(registry.is_supported::<Unconfigured>("anything"));
        assert!(!registry.is_delegated::<Unconfigured>("anything"));

        registry.subscribe(&instance, "anything", noop()).unwrap();
        assert_eq!(instance.handlers().listener_count("anything"), 1);
    }

    #[test]
    fn unsupported_event_is_rejected_with_library_name() {
        let registry = EventRegistry::default();
        registry.configure(
            TypeConfig::<Library>::builder()
                .events(AllowedEvents::new().local("known"))
                .library("Library")
                .build(),
        );
        let instance = Library::default();

        let err = registry.subscribe(&instance, "unknown", noop()).unwrap_err();
        match err {
            EventError::UnsupportedEvent { event, library } => {
                assert_eq!(event, "unknown");
                assert_eq!(library.as_deref(), Some("Library"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(instance.handlers().is_empty());
        assert_eq!(registry.library_name::<Library>().as_deref(), Some("Library"));
    }

    #[test]
    fn reconfigure_applies_to_existing_instances() {
        let registry = EventRegistry::default();
        let instance = Reconfigured::default();

        registry.configure(
            TypeConfig::<Reconfigured>::builder()
                .events(AllowedEvents::new().local("first"))
                .build(),
        );
        registry.subscribe(&instance, "first", noop()).unwrap();
        assert!(registry.subscribe(&instance, "second", noop()).is_err());

        registry.configure(
            TypeConfig::<Reconfigured>::builder()
                .events(AllowedEvents::new().local("second"))
                .build(),
        );
        registry.subscribe(&instance, "second", noop()).unwrap();
        assert!(registry.subscribe(&instance, "first", noop()).is_err());
        assert_eq!(registry.library_name::<Reconfigured>(), None);
    }

    source_type!(Repeated);

    #[test]
    fn configure_twice_with_same_args_changes_nothing() {
        let registry = EventRegistry::default();
        let config = || {
            TypeConfig::<Repeated>::builder()
                .events(AllowedEvents::new().local("tick"))
                .library("Repeated")
                .build()
        };
        let instance = Repeated::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |log: &Arc<Mutex<Vec<Payload>>>| {
            let log = log.clone();
            listener(move |p| {
                log.lock().unwrap().push(p.clone());
                Ok(())
            })
        };

        registry.configure(config());
        registry.subscribe(&instance, "tick", record(&log)).unwrap();

        registry.configure(config());
        assert_eq!(instance.handlers().listener_count("tick"), 1);
        assert_eq!(registry.library_name::<Repeated>().as_deref(), Some("Repeated"));
        assert!(registry.is_supported::<Repeated>("tick"));
        assert!(!registry.is_supported::<Repeated>("tock"));
        assert!(matches!(
            registry.subscribe(&instance, "tock", noop()),
            Err(EventError::UnsupportedEvent { .. })
        ));

        registry.subscribe(&instance, "tick", record(&log)).unwrap();
        instance.raise("tick", json!(1)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![json!(1), json!(1)]);
    }

    #[test]
    fn local_events_fire_in_order() {
        let registry = EventRegistry::default();
        registry.configure(
            TypeConfig::<Library>::builder()
                .events(AllowedEvents::new().local("tick"))
                .build(),
        );
        let instance = Library::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = log.clone();
            registry
                .subscribe(
                    &instance,
                    "tick",
                    listener(move |p| {
                        log.lock().unwrap().push(format!("{tag}{p}"));
                        Ok(())
                    }),
                )
                .unwrap();
        }

        instance.raise("tick", json!(7)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn not_delegated_guard() {
        let registry = EventRegistry::default();
        let instance = Unconfigured::default();
        let err = registry.delegated_target(&instance, "x").unwrap_err();
        assert!(matches!(err, EventError::NotDelegated { event } if event == "x"));
    }

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl EventSubscribable for Recorder {
        fn subscribe(&self, event: &str, _listener: Listener) -> EventResult<()> {
            self.seen.lock().unwrap().push(event.to_string());
            Ok(())
        }

        fn library_name(&self) -> Option<String> {
            Some("Recorder".to_string())
        }
    }

    source_type!(FixedDelegator);

    #[test]
    fn fixed_delegation_forwards_to_target() {
        let registry = EventRegistry::default();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        registry.configure(
            TypeConfig::<FixedDelegator>::builder()
                .events(AllowedEvents::new().delegate_to("ping", recorder.clone()))
                .library("FixedDelegator")
                .build(),
        );
        let instance = FixedDelegator::default();

        assert!(registry.is_delegated::<FixedDelegator>("ping"));
        registry.subscribe(&instance, "ping", noop()).unwrap();

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["ping"]);
        assert_eq!(instance.handlers().listener_count("ping"), 0);

        let target = registry.delegated_target(&instance, "ping").unwrap().unwrap();
        assert_eq!(target.library_name().as_deref(), Some("Recorder"));
    }
}
