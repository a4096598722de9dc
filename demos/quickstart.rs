//! Quickstart: Store and find entities with Docket
//!
//! This minimal example shows how to:
//! 1. Create an in-memory datastore
//! 2. Store entities with typed properties
//! 3. Look them up by id, by exact values and by query string
//! 4. Replace and delete entities
//!
//! Run with: `cargo run --example quickstart`

use docket::{DatastoreFactory, Entity, QueryBuilder};

fn print_entities(label: &str, entities: &[Entity]) {
    println!("[{label}] {} result(s)", entities.len());
    for entity in entities {
        let score = entity
            .score()
            .map(|s| format!(" (score {s:.3})"))
            .unwrap_or_default();
        println!("  {}{score}", entity.id());
        for (name, value) in entity.properties() {
            println!("    {name}: {value}");
        }
    }
}

fn main() -> docket::Result<()> {
    println!("=== Docket Quickstart ===\n");

    // 1. Create the datastore
    let store = DatastoreFactory::create_in_memory()?;

    // 2. Store a few entities
    let mut alice = store.create_entity();
    alice
        .set_property("name", "Alice")
        .set_property("city", "Paris")
        .set_property("bio", "Writes compilers and climbs rocks")
        .set_property_as_long("age", 30);
    store.put(&alice)?;

    store
        .create_and_save_entity([("name", "Bob"), ("city", "Paris"), ("bio", "Bakes bread")])?
        .create_and_save_entity([("name", "Carol"), ("city", "Lyon"), ("bio", "Writes poems")])?;
    println!("Stored {} entities.\n", store.get_all_entities()?.len());

    // 3. Look them up
    let loaded = store.get(alice.id())?;
    println!("[Get] {} is {} years old\n", loaded.property("name")?, loaded.get_long("age")?);

    print_entities("city = Paris", &store.search_fields([("city", "Paris")])?);
    print_entities("bio:Writes -city:Lyon", &store.search_entities("bio:Writes -city:Lyon")?);

    let query = QueryBuilder::new().add_item("city", "Paris").add_filter("bio", "bread").build();
    print_entities(&query.to_string(), &store.search_query(&query)?);

    // 4. Replace and delete
    alice.set_property_as_long("age", 31);
    store.put(&alice)?;
    println!("\n[Put] Alice is now {}", store.get(alice.id())?.get_long("age")?);

    store.delete(&alice)?;
    println!("[Delete] {} entities left", store.get_all_entities()?.len());

    store.close()?;
    Ok(())
}
