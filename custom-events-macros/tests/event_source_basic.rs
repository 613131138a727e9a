use custom_events::{
    AllowedEvents, EventSource, EventSubscribable, HandlerTable, configure, event_source, listener,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[event_source]
#[derive(Debug)]
struct Lamp {
    on: bool,
}

impl Lamp {
    fn new() -> Self {
        Self {
            handlers: HandlerTable::new(),
            on: false,
        }
    }

    fn toggle(&mut self) -> custom_events::EventResult<()> {
        self.on = !self.on;
        self.raise("on-toggle", json!({ "on": self.on }))
    }
}

// 自定义字段名，且字段已由使用方声明
#[event_source(field = listeners)]
#[derive(Default)]
struct Bell {
    listeners: HandlerTable,
    rings: u32,
}

#[event_source]
struct Wrapper<T: Send + Sync + 'static> {
    inner: T,
}

#[test]
fn injected_field_backs_event_source() {
    let mut lamp = Lamp::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        lamp.subscribe(
            "on-toggle",
            listener(move |p| {
                seen.lock().unwrap().push(p.clone());
                Ok(())
            }),
        )
        .unwrap();
    }

    lamp.toggle().unwrap();
    lamp.toggle().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![json!({ "on": true }), json!({ "on": false })]
    );
    assert_eq!(lamp.handlers.listener_count("on-toggle"), 1);
    assert!(format!("{lamp:?}").contains("on-toggle"));
}

#[test]
fn custom_field_name_is_used() {
    configure::<Bell>(AllowedEvents::new().local("on-ring"), Some("Bell"));
    let bell = Bell::default();

    bell.subscribe("on-ring", listener(|_| Ok(()))).unwrap();
    assert_eq!(bell.listeners.listener_count("on-ring"), 1);
    assert_eq!(bell.rings, 0);
    assert!(bell.subscribe("on-crack", listener(|_| Ok(()))).is_err());
    assert_eq!(bell.library_name().as_deref(), Some("Bell"));
}

#[test]
fn generic_struct_is_supported() {
    let wrapper = Wrapper {
        handlers: HandlerTable::new(),
        inner: 5_u8,
    };
    wrapper.subscribe("anything", listener(|_| Ok(()))).unwrap();
    assert_eq!(wrapper.handlers().listener_count("anything"), 1);
    assert_eq!(wrapper.inner, 5);
}
