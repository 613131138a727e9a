//! 类型级事件声明（AllowedEvents）
//!
//! 每个类型声明一次：事件名映射到本地处理（`Local`）或委托（`Delegated`）。
//! 委托目标可以是固定引用，也可以是实例上的某个字段，字段在每次订阅时重新解析。
//!
use crate::source::EventSubscribable;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

type FieldResolver<T> =
    Arc<dyn for<'a> Fn(&'a T) -> Option<&'a dyn EventSubscribable> + Send + Sync>;

/// 委托描述：事件订阅转交给哪个对象
pub enum Delegation<T> {
    /// 固定的目标对象
    Fixed(Arc<dyn EventSubscribable>),
    /// 实例字段，`resolve` 返回 `None` 表示字段当前未设置
    Field {
        field: &'static str,
        resolve: FieldResolver<T>,
    },
}

impl<T> Delegation<T> {
    /// 解析委托目标
    pub fn resolve<'a>(&self, instance: &'a T) -> Option<DelegateTarget<'a>> {
        match self {
            Self::Fixed(target) => Some(DelegateTarget::Shared(target.clone())),
            Self::Field { resolve, .. } => resolve(instance).map(DelegateTarget::Borrowed),
        }
    }

    /// 字段委托时返回字段名
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Fixed(_) => None,
            Self::Field { field, .. } => Some(*field),
        }
    }
}

impl<T> Clone for Delegation<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(target) => Self::Fixed(target.clone()),
            Self::Field { field, resolve } => Self::Field {
                field: *field,
                resolve: resolve.clone(),
            },
        }
    }
}

impl<T> fmt::Debug for Delegation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(target) => f
                .debug_tuple("Fixed")
                .field(&target.library_name())
                .finish(),
            Self::Field { field, .. } => f.debug_struct("Field").field("field", field).finish(),
        }
    }
}

/// 已解析的委托目标
pub enum DelegateTarget<'a> {
    Borrowed(&'a dyn EventSubscribable),
    Shared(Arc<dyn EventSubscribable>),
}

impl<'a> Deref for DelegateTarget<'a> {
    type Target = dyn EventSubscribable + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Borrowed(target) => *target,
            Self::Shared(target) => target.as_ref(),
        }
    }
}

impl fmt::Debug for DelegateTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateTarget")
            .field("library", &self.library_name())
            .finish()
    }
}

pub enum AllowedEvent<T> {
    Local,
    Delegated(Delegation<T>),
}

impl<T> AllowedEvent<T> {
    pub fn delegation(&self) -> Option<&Delegation<T>> {
        match self {
            Self::Local => None,
            Self::Delegated(d) => Some(d),
        }
    }
}

impl<T> fmt::Debug for AllowedEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Delegated(d) => f.debug_tuple("Delegated").field(d).finish(),
        }
    }
}

impl<T> Clone for AllowedEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Local => Self::Local,
            Self::Delegated(d) => Self::Delegated(d.clone()),
        }
    }
}

/// 事件名到声明的不可变映射
///
/// ```
/// use custom_events::{AllowedEvents, EventSubscribable};
///
/// struct Person;
/// struct Customer {
///     person: Option<Person>,
/// }
/// # impl EventSubscribable for Person {
/// #     fn subscribe(&self, _: &str, _: custom_events::Listener) -> custom_events::EventResult<()> { Ok(()) }
/// # }
///
/// let events = AllowedEvents::<Customer>::new()
///     .local("on-purchase")
///     .delegate_to_field("on-name-changed", "person", |c| {
///         c.person.as_ref().map(|p| p as &dyn EventSubscribable)
///     });
///
/// assert!(events.contains("on-purchase"));
/// assert!(events.get("on-name-changed").unwrap().delegation().is_some());
/// ```
pub struct AllowedEvents<T> {
    events: HashMap<String, AllowedEvent<T>>,
}

impl<T> AllowedEvents<T> {
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
        }
    }

    /// 声明由实例自身处理的事件
    pub fn local(mut self, event: impl Into<String>) -> Self {
        self.events.insert(event.into(), AllowedEvent::Local);
        self
    }

    /// 声明委托给固定对象的事件
    pub fn delegate_to(
        mut self,
        event: impl Into<String>,
        target: Arc<dyn EventSubscribable>,
    ) -> Self {
        self.events
            .insert(event.into(), AllowedEvent::Delegated(Delegation::Fixed(target)));
        self
    }

    /// 声明委托给实例字段的事件，字段在每次订阅时重新读取
    pub fn delegate_to_field<F>(
        mut self,
        event: impl Into<String>,
        field: &'static str,
        resolve: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a T) -> Option<&'a dyn EventSubscribable> + Send + Sync + 'static,
    {
        self.events.insert(
            event.into(),
            AllowedEvent::Delegated(Delegation::Field {
                field,
                resolve: Arc::new(resolve),
            }),
        );
        self
    }

    pub fn get(&self, event: &str) -> Option<&AllowedEvent<T>> {
        self.events.get(event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<T> Default for AllowedEvents<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for AllowedEvents<T> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<T> fmt::Debug for AllowedEvents<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.events.iter()).finish()
    }
}

impl<T, S: Into<String>> FromIterator<S> for AllowedEvents<T> {
    /// 由事件名集合构造，全部为本地事件
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |events, name| events.local(name))
    }
}
