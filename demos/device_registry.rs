//! Example usage of the binding engine against a device-registry tree

use serde_json::{json, Value};
use snapbind::{Bindable, BindableObject, BindableSnapshot, Binder, Mapper};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct Lamp {
    id: Option<String>,
    watts: Option<i64>,
    dimmable: Option<bool>,
}

impl Bindable for Lamp {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder
            .identity(&mut self.id)
            .field("watts", &mut self.watts)
            .field("dimmable", &mut self.dimmable);
    }
}

impl BindableSnapshot for Lamp {}

#[derive(Debug, Clone, Default)]
struct Location {
    room: Option<String>,
    floor: Option<i64>,
}

impl Bindable for Location {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder
            .field("room", &mut self.room)
            .field("floor", &mut self.floor);
    }
}

impl BindableObject for Location {}

#[derive(Debug, Clone, Default)]
struct Hub {
    id: Option<String>,
    label: Option<String>,
    location: Option<Location>,
    lamps: Vec<Lamp>,
    metadata: BTreeMap<String, Value>,
}

impl Bindable for Hub {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder
            .identity(&mut self.id)
            .field("label", &mut self.label)
            .object("location", &mut self.location)
            .list("lamps", &mut self.lamps)
            .dictionary("metadata", &mut self.metadata);
    }
}

impl BindableSnapshot for Hub {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mapper = Mapper::new();

    // ========================================
    // Parse Demo
    // ========================================

    println!("=== Parse Demo ===\n");

    // A hub node as streamed out of the store, keyed by "hub-7"
    let node = json!({
        "id": "hub-7",
        "label": "Hallway Hub",
        "location": { "room": "hallway", "floor": 1 },
        "lamps": {
            "lamp-1": { "id": "lamp-1", "watts": 9, "dimmable": true },
            "lamp-2": { "id": "lamp-2", "watts": 60, "dimmable": false },
        },
        "firmware": "2.4.1",
        "rssi": -52,
    });

    let hub: Hub = mapper.parse_snapshot("hub-7", &node)?;
    println!("Hub: {:?}", hub.label.as_deref().unwrap_or("?"));
    println!("Lamps bound: {}", hub.lamps.len());
    for lamp in &hub.lamps {
        println!(
            "  {} -> {}W (dimmable: {})",
            lamp.id.as_deref().unwrap_or("?"),
            lamp.watts.unwrap_or(0),
            lamp.dimmable.unwrap_or(false),
        );
    }

    // Keys no binding declared for land in the metadata dictionary
    println!("Absorbed metadata: {:?}", hub.metadata);

    // ========================================
    // Typo Detection Demo
    // ========================================

    println!("\n=== Typo Detection Demo ===\n");

    // "floorr" matches no declared binding on Location (and Location has no
    // dictionary), so the parse fails naming the key
    let bad = json!({ "room": "attic", "floorr": 2 });
    match mapper.parse_object::<Location>(&bad) {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("Misspelled key caught: {}", err),
    }

    // Hub declares a metadata catch-all, so the same typo inside a hub node
    // is absorbed there instead of failing the parse
    let sloppy = json!({ "location": { "room": "attic", "floorr": 2 } });
    let hub8: Hub = mapper.parse_snapshot("hub-8", &sloppy)?;
    println!("Catch-all kept the unparseable subtree: {:?}", hub8.metadata);

    // ========================================
    // Write-Back Demo
    // ========================================

    println!("\n=== Write-Back Demo ===\n");

    let mut hub = hub;
    hub.label = Some("Hallway Hub (renamed)".to_string());
    hub.lamps[0].watts = Some(12);

    let emitted = mapper.serialize_snapshot(&hub);
    println!(
        "Node for the store:\n{}",
        serde_json::to_string_pretty(&Value::Object(emitted))?
    );

    // ========================================
    // Custom Identity Key Demo
    // ========================================

    println!("\n=== Custom Identity Key Demo ===\n");

    // Stores that name their snapshot key something other than "id"
    let mapper = Mapper::with_identity_key("key");
    let lamp: Lamp = mapper.parse_snapshot("lamp-9", &json!({ "watts": 4 }))?;
    println!("Identity under custom key: {:?}", lamp.id);

    let emitted = mapper.serialize_snapshot(&lamp);
    println!("Emitted: {}", Value::Object(emitted));

    Ok(())
}
