use docket::{Datastore, DatastoreConfig, DatastoreFactory, DocketError};

fn people() -> docket::Result<Datastore> {
    let store = DatastoreFactory::create_in_memory()?;
    for (name, city, age, bio) in [
        ("Alice", "Paris", 30, "likes quick brown foxes"),
        ("Bob", "Paris", 45, "rides a brown horse"),
        ("Carol", "Lyon", 22, "quick with numbers"),
        ("Dave", "Berlin", 61, "collects old maps"),
    ] {
        let mut entity = store.create_entity();
        entity
            .set_property("name", name)
            .set_property("city", city)
            .set_property_as_long("age", age)
            .set_property("bio", bio);
        store.put(&entity)?;
    }
    Ok(store)
}

fn names(store: &Datastore, query: &str) -> docket::Result<Vec<String>> {
    let mut names: Vec<String> = store
        .search_entities(query)?
        .iter()
        .map(|e| e.property("name").map(str::to_string))
        .collect::<docket::Result<_>>()?;
    names.sort();
    Ok(names)
}

#[test]
fn test_juxtaposition_is_or() -> docket::Result<()> {
    let store = people()?;
    assert_eq!(names(&store, "name:Alice name:Dave")?, vec!["Alice", "Dave"]);
    assert_eq!(names(&store, "name:Alice OR name:Dave")?, vec!["Alice", "Dave"]);
    Ok(())
}

#[test]
fn test_and_and_modifiers() -> docket::Result<()> {
    let store = people()?;
    assert_eq!(names(&store, "city:Paris AND bio:brown")?, vec!["Alice", "Bob"]);
    assert_eq!(names(&store, "city:Paris AND bio:quick")?, vec!["Alice"]);
    assert_eq!(names(&store, "+bio:quick -city:Lyon")?, vec!["Alice"]);
    assert_eq!(names(&store, "bio:brown NOT name:Bob")?, vec!["Alice"]);
    assert_eq!(names(&store, "city:Paris && !name:Alice")?, vec!["Bob"]);
    Ok(())
}

#[test]
fn test_pure_negation_matches_the_rest() -> docket::Result<()> {
    let store = people()?;
    assert_eq!(names(&store, "-city:Paris")?, vec!["Carol", "Dave"]);
    Ok(())
}

#[test]
fn test_groups_and_phrases() -> docket::Result<()> {
    let store = people()?;
    assert_eq!(
        names(&store, "city:(Lyon OR Berlin)")?,
        vec!["Carol", "Dave"]
    );
    assert_eq!(names(&store, "bio:\"brown horse\"")?, vec!["Bob"]);
    assert!(names(&store, "bio:\"horse brown\"")?.is_empty());
    Ok(())
}

#[test]
fn test_wildcards_and_ranges() -> docket::Result<()> {
    let store = people()?;
    assert_eq!(names(&store, "name:?ob")?, vec!["Bob"]);
    assert_eq!(names(&store, "bio:fox*")?, vec!["Alice"]);
    assert_eq!(names(&store, "age:[30 TO 61}")?, vec!["Alice", "Bob"]);
    assert_eq!(names(&store, "age:[* TO 25]")?, vec!["Carol"]);
    assert_eq!(names(&store, "age:{45 TO *]")?, vec!["Dave"]);
    assert_eq!(names(&store, "name:[B TO C]")?, vec!["Bob"]);
    Ok(())
}

#[test]
fn test_match_all_and_escapes() -> docket::Result<()> {
    let store = people()?;
    assert_eq!(store.search_entities("*:*")?.len(), 4);

    let mut odd = store.create_entity();
    odd.set_property("name", "Eve").set_property("handle", "e:ve");
    store.put(&odd)?;
    assert_eq!(names(&store, "handle:e\\:ve")?, vec!["Eve"]);
    Ok(())
}

#[test]
fn test_results_are_ranked() -> docket::Result<()> {
    let store = people()?;
    // Carol's bio is shorter, so "quick" weighs more there.
    let found = store.search_entities("bio:quick")?;
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].property("name")?, "Carol");
    assert!(found[0].score() >= found[1].score());
    Ok(())
}

#[test]
fn test_malformed_queries() -> docket::Result<()> {
    let store = people()?;
    for bad in ["", "   ", "(city:Paris", "city:Paris)", "city:", "a AND", "\"open", "[1 TO"] {
        assert!(
            matches!(store.search_entities(bad), Err(DocketError::QuerySyntax(_))),
            "expected a syntax error for {bad:?}"
        );
    }
    Ok(())
}

#[test]
fn test_max_results_caps_searches_not_scans() -> docket::Result<()> {
    let config = DatastoreConfig::builder().max_results(3).build();
    let store = DatastoreFactory::create(config)?;
    for i in 0..5 {
        let name = format!("n{i}");
        store.create_and_save_entity([("kind", "item"), ("name", name.as_str())])?;
    }

    assert_eq!(store.search_entities("kind:item")?.len(), 3);
    assert_eq!(store.search_fields([("kind", "item")])?.len(), 3);
    assert_eq!(store.get_all_entities()?.len(), 5);
    Ok(())
}
