use anyhow::Result;
use custom_events::{EventSubscribable, listener};
use demo::{Customer, NameChanged, ON_NAME_CHANGED, ON_NAME_EMPTY, ON_PURCHASE, Person};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    demo::configure_library();

    let mut person = Person::new("Alice");
    person.subscribe(
        ON_NAME_CHANGED,
        listener(|payload| {
            let changed = NameChanged::from_payload(payload)?;
            tracing::info!(old = %changed.old_name, new = %changed.new_name, "person renamed");
            Ok(())
        }),
    )?;
    person.subscribe(
        ON_NAME_EMPTY,
        listener(|_| {
            tracing::info!("person name cleared");
            Ok(())
        }),
    )?;

    person.set_name("Bob")?;
    person.set_name("")?;

    if let Err(err) = person.subscribe("on-birthday", listener(|_| Ok(()))) {
        tracing::warn!(error = %err, "subscription rejected");
    }

    let mut customer = Customer::new("c-001", Some(Person::new("Carol")));
    customer.subscribe(
        ON_NAME_CHANGED,
        listener(|payload| {
            let changed = NameChanged::from_payload(payload)?;
            tracing::info!(new = %changed.new_name, "customer's person renamed");
            Ok(())
        }),
    )?;
    customer.subscribe(
        ON_PURCHASE,
        listener(|payload| {
            tracing::info!(%payload, "purchase");
            Ok(())
        }),
    )?;

    // 委托事件登记在 person 上，由 person 触发
    if let Some(person) = customer.person_mut() {
        person.set_name("Caroline")?;
    }
    customer.purchase("coffee")?;

    customer.set_person(None);
    if let Err(err) = customer.subscribe(ON_NAME_CHANGED, listener(|_| Ok(()))) {
        tracing::warn!(error = %err, "delegation failed");
    }

    Ok(())
}
