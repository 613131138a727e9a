//! 示例库：`Person` 声明两个本地事件，`Customer` 将改名事件委托给其 `person` 字段。
//!
use custom_events::{
    AllowedEvents, EventResult, EventSource, EventSubscribable, HandlerTable, Payload, configure,
    event_source,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const ON_NAME_CHANGED: &str = "on-name-changed";
pub const ON_NAME_EMPTY: &str = "on-name-empty";
pub const ON_PURCHASE: &str = "on-purchase";

/// `on-name-changed` 的载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameChanged {
    pub old_name: String,
    pub new_name: String,
}

impl NameChanged {
    pub fn from_payload(payload: &Payload) -> serde_json::Result<Self> {
        Self::deserialize(payload)
    }
}

#[event_source]
#[derive(Debug)]
pub struct Person {
    name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            handlers: HandlerTable::new(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 修改姓名：置空触发 `on-name-empty`，否则在值变化时触发 `on-name-changed`
    pub fn set_name(&mut self, value: impl Into<String>) -> EventResult<()> {
        let value = value.into();
        let old_name = std::mem::replace(&mut self.name, value);

        if self.name.is_empty() {
            self.raise(ON_NAME_EMPTY, Payload::Null)
        } else if old_name != self.name {
            self.raise(
                ON_NAME_CHANGED,
                json!({ "oldName": old_name, "newName": self.name }),
            )
        } else {
            Ok(())
        }
    }
}

#[event_source]
#[derive(Debug)]
pub struct Customer {
    customer_id: String,
    person: Option<Person>,
}

impl Customer {
    pub fn new(customer_id: impl Into<String>, person: Option<Person>) -> Self {
        Self {
            handlers: HandlerTable::new(),
            customer_id: customer_id.into(),
            person,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn person(&self) -> Option<&Person> {
        self.person.as_ref()
    }

    pub fn person_mut(&mut self) -> Option<&mut Person> {
        self.person.as_mut()
    }

    /// 替换关联的 person，之后的委托订阅转交给新对象
    pub fn set_person(&mut self, person: Option<Person>) -> Option<Person> {
        std::mem::replace(&mut self.person, person)
    }

    pub fn purchase(&self, item: &str) -> EventResult<()> {
        self.raise(
            ON_PURCHASE,
            json!({ "customerId": self.customer_id, "item": item }),
        )
    }
}

/// 声明示例库的事件（可重复调用）
pub fn configure_library() {
    configure::<Person>(
        AllowedEvents::new().local(ON_NAME_CHANGED).local(ON_NAME_EMPTY),
        Some("Person"),
    );
    configure::<Customer>(
        AllowedEvents::<Customer>::new()
            .local(ON_PURCHASE)
            .delegate_to_field(ON_NAME_CHANGED, "person", |c| {
                c.person.as_ref().map(|p| p as &dyn EventSubscribable)
            }),
        Some("Customer"),
    );
}
