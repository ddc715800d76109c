//! # Binding Engine Tests
//!
//! End-to-end coverage for the public mapping surface:
//! - Parse direction: full object graphs from realistic store trees
//! - Serialize direction: node reconstruction, list keying, flattening
//! - Round trips: node -> graph -> node and list write-back
//! - Failure modes: misspelled keys at every depth
//!
//! ## Test Categories
//!
//! 1. Parse tests - whole-graph population and partial nodes
//! 2. Round-trip tests - byte-for-byte node reproduction
//! 3. Error tests - fail-loud typo detection
//! 4. Identity tests - custom identity keys, list keying
//! 5. Concurrency tests - one shared mapper across threads

use serde_json::{json, Value};
use snapbind::{Bindable, BindableObject, BindableSnapshot, Binder, Mapper, ToValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

// ============================================================================
// FIXTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SensorKind {
    Temperature,
    Humidity,
    Motion,
}

impl ToValue for SensorKind {
    fn to_value(&self) -> Value {
        let tag = match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Motion => "motion",
        };
        Value::String(tag.to_owned())
    }
}

fn sensor_kind(value: &Value) -> Option<SensorKind> {
    match value.as_str()? {
        "temperature" => Some(SensorKind::Temperature),
        "humidity" => Some(SensorKind::Humidity),
        "motion" => Some(SensorKind::Motion),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Sensor {
    id: Option<String>,
    kind: Option<SensorKind>,
    reading: Option<f64>,
    active: Option<bool>,
}

impl Bindable for Sensor {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder
            .identity(&mut self.id)
            .field_with("kind", &mut self.kind, sensor_kind)
            .field("reading", &mut self.reading)
            .field("active", &mut self.active);
    }
}

impl BindableSnapshot for Sensor {}

#[derive(Debug, Clone, Default, PartialEq)]
struct Thresholds {
    low: Option<f64>,
    high: Option<f64>,
}

impl Bindable for Thresholds {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder.field("low", &mut self.low).field("high", &mut self.high);
    }
}

impl BindableObject for Thresholds {}

#[derive(Debug, Clone, Default, PartialEq)]
struct Room {
    id: Option<String>,
    name: Option<String>,
    thresholds: Option<Thresholds>,
    sensors: Vec<Sensor>,
    attributes: BTreeMap<String, Value>,
}

impl Bindable for Room {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder
            .identity(&mut self.id)
            .field("name", &mut self.name)
            .object("thresholds", &mut self.thresholds)
            .list("sensors", &mut self.sensors)
            .dictionary("attributes", &mut self.attributes);
    }
}

impl BindableSnapshot for Room {}

/// Room without the catch-all: every key must match a declared binding, so
/// misspellings anywhere in the subtree fail the parse.
#[derive(Debug, Clone, Default, PartialEq)]
struct StrictRoom {
    id: Option<String>,
    name: Option<String>,
    thresholds: Option<Thresholds>,
    sensors: Vec<Sensor>,
}

impl Bindable for StrictRoom {
    fn bind(&mut self, binder: &mut Binder<'_>) {
        binder
            .identity(&mut self.id)
            .field("name", &mut self.name)
            .object("thresholds", &mut self.thresholds)
            .list("sensors", &mut self.sensors);
    }
}

impl BindableSnapshot for StrictRoom {}

/// A room node as a realtime store would stream it, literal identity pairs
/// included so serialization reproduces it byte for byte.
fn living_room_node() -> Value {
    json!({
        "id": "living",
        "name": "Living Room",
        "thresholds": { "low": 17.5, "high": 26.0 },
        "sensors": {
            "s1": { "id": "s1", "kind": "temperature", "reading": 21.4, "active": true },
            "s2": { "id": "s2", "kind": "motion", "active": false },
        },
        "floor": 2,
        "zone": "north",
    })
}

fn sample_sensor(id: &str, kind: SensorKind, reading: f64) -> Sensor {
    Sensor {
        id: Some(id.to_owned()),
        kind: Some(kind),
        reading: Some(reading),
        active: Some(true),
    }
}

// ============================================================================
// PARSE TESTS
// ============================================================================

#[test]
fn parse_populates_the_whole_graph() {
    let mapper = Mapper::new();
    let room: Room = mapper.parse_snapshot("living", &living_room_node()).unwrap();

    assert_eq!(room.id.as_deref(), Some("living"));
    assert_eq!(room.name.as_deref(), Some("Living Room"));

    let thresholds = room.thresholds.as_ref().unwrap();
    assert_eq!(thresholds.low, Some(17.5));
    assert_eq!(thresholds.high, Some(26.0));

    assert_eq!(room.sensors.len(), 2);
    assert_eq!(room.sensors[0].id.as_deref(), Some("s1"));
    assert_eq!(room.sensors[0].kind, Some(SensorKind::Temperature));
    assert_eq!(room.sensors[0].reading, Some(21.4));
    assert_eq!(room.sensors[1].id.as_deref(), Some("s2"));
    assert_eq!(room.sensors[1].kind, Some(SensorKind::Motion));
    assert_eq!(room.sensors[1].active, Some(false));

    assert_eq!(room.attributes.len(), 2);
    assert_eq!(room.attributes["floor"], json!(2));
    assert_eq!(room.attributes["zone"], json!("north"));
}

#[test]
fn partial_nodes_leave_unmentioned_slots_default() {
    let mapper = Mapper::new();
    let room: Room = mapper
        .parse_snapshot("living", &json!({ "name": "Nook" }))
        .unwrap();
    assert_eq!(room.id.as_deref(), Some("living"));
    assert_eq!(room.name.as_deref(), Some("Nook"));
    assert!(room.thresholds.is_none());
    assert!(room.sensors.is_empty());
    assert!(room.attributes.is_empty());
}

#[test]
fn unfit_custom_decode_leaves_the_slot_empty() {
    let mapper = Mapper::new();
    let sensor: Sensor = mapper
        .parse_snapshot("s9", &json!({ "kind": "barometric" }))
        .unwrap();
    assert_eq!(sensor.kind, None);
}

// ============================================================================
// ROUND-TRIP TESTS
// ============================================================================

#[test]
fn round_trip_reproduces_the_node() {
    let mapper = Mapper::new();
    let room: Room = mapper.parse_snapshot("living", &living_room_node()).unwrap();
    let node = mapper.serialize_snapshot(&room);
    assert_eq!(Value::Object(node), living_room_node());
}

#[test]
fn list_write_back_round_trips() {
    let mapper = Mapper::new();
    let sensors = vec![
        sample_sensor("s1", SensorKind::Temperature, 21.4),
        sample_sensor("s2", SensorKind::Humidity, 0.46),
    ];

    let nodes = mapper.serialize_list(&sensors);
    assert_eq!(nodes.len(), 2);
    assert!(nodes.contains_key("s1"));
    assert!(nodes.contains_key("s2"));

    let reparsed: Vec<Sensor> = mapper.parse_list(&Value::Object(nodes)).unwrap();
    assert_eq!(reparsed, sensors);
}

#[test]
fn serialized_lists_skip_elements_without_identity() {
    let mapper = Mapper::new();
    let sensors = vec![
        sample_sensor("s1", SensorKind::Temperature, 21.4),
        Sensor::default(),
    ];
    let nodes = mapper.serialize_list(&sensors);
    assert_eq!(nodes.len(), 1);
    assert!(nodes.contains_key("s1"));
}

#[test]
fn serialized_lists_keep_the_last_of_duplicate_identities() {
    let mapper = Mapper::new();
    let sensors = vec![
        sample_sensor("s1", SensorKind::Temperature, 21.4),
        sample_sensor("s1", SensorKind::Humidity, 0.46),
    ];
    let nodes = mapper.serialize_list(&sensors);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes["s1"]["kind"], json!("humidity"));
    assert_eq!(nodes["s1"]["reading"], json!(0.46));
}

#[test]
fn explicit_null_attribute_survives_round_trips() {
    let mapper = Mapper::new();
    let mut room = Room {
        id: Some("attic".to_owned()),
        ..Room::default()
    };
    room.attributes.insert("muted".to_owned(), Value::Null);

    let node = mapper.serialize_snapshot(&room);
    assert_eq!(node["muted"], Value::Null);

    let reparsed: Room = mapper.parse_snapshot("attic", &Value::Object(node)).unwrap();
    assert_eq!(reparsed.attributes["muted"], Value::Null);
}

// ============================================================================
// ERROR TESTS
// ============================================================================

#[test]
fn typo_deep_in_the_tree_names_the_key() {
    let node = json!({
        "id": "living",
        "name": "Living Room",
        "thresholds": { "low": 17.5, "high": 26.0 },
        "sensors": {
            "s1": { "kind": "temperature", "raeding": 21.4 },
        },
    });

    let mapper = Mapper::new();
    let err = mapper
        .parse_snapshot::<StrictRoom>("living", &node)
        .unwrap_err();
    assert_eq!(err.key(), "raeding");
    assert!(err.to_string().contains("raeding"));
}

#[test]
fn catch_all_absorbs_a_subtree_its_binding_rejected() {
    // Room declares a dictionary, so the sensors subtree that fails its
    // list binding lands there whole instead of failing the parse. Strict
    // targets get strict errors; targets with a catch-all keep the data.
    let mut node = living_room_node();
    let reading = node["sensors"]["s1"]
        .as_object_mut()
        .unwrap()
        .remove("reading")
        .unwrap();
    node["sensors"]["s1"]["raeding"] = reading;

    let mapper = Mapper::new();
    let room: Room = mapper.parse_snapshot("living", &node).unwrap();
    assert!(room.sensors.is_empty());
    assert_eq!(room.attributes["sensors"], node["sensors"]);
}

#[test]
fn misspelled_key_fails_where_no_dictionary_backstops() {
    let mapper = Mapper::new();
    let err = mapper
        .parse_object::<Thresholds>(&json!({ "low": 17.5, "hgih": 26.0 }))
        .unwrap_err();
    assert_eq!(err.key(), "hgih");
    assert!(err.cause().contains("no binding declared"));
}

#[test]
fn parse_list_skips_scalar_entries_but_fails_on_binding_errors() {
    let mapper = Mapper::new();

    // Scalar noise next to real nodes is not an element, just skipped.
    let sensors: Vec<Sensor> = mapper
        .parse_list(&json!({
            "s1": { "kind": "temperature", "reading": 21.4 },
            "last_sync": "2024-11-02T10:00:00Z",
        }))
        .unwrap();
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].id.as_deref(), Some("s1"));

    // A misspelling inside a real entry still aborts the whole list.
    let err = mapper
        .parse_list::<Sensor>(&json!({ "s1": { "raeding": 21.4 } }))
        .unwrap_err();
    assert_eq!(err.key(), "raeding");
}

// ============================================================================
// IDENTITY TESTS
// ============================================================================

#[test]
fn custom_identity_key_round_trips() {
    let mapper = Mapper::with_identity_key("key");
    let node = json!({
        "key": "desk",
        "kind": "humidity",
        "reading": 0.4,
    });

    let sensor: Sensor = mapper.parse_snapshot("desk", &node).unwrap();
    assert_eq!(sensor.id.as_deref(), Some("desk"));

    let emitted = mapper.serialize_snapshot(&sensor);
    assert_eq!(Value::Object(emitted), node);
}

#[test]
fn default_identity_key_is_rejected_under_a_custom_mapper() {
    let mapper = Mapper::with_identity_key("key");
    let err = mapper
        .parse_snapshot::<Sensor>("desk", &json!({ "id": "desk" }))
        .unwrap_err();
    assert_eq!(err.key(), "id");
}

#[test]
fn list_parse_is_independent_of_key_insertion_order() {
    let fixture = [
        ("s1", json!({ "kind": "temperature", "reading": 21.4 })),
        ("s2", json!({ "kind": "humidity", "reading": 0.46 })),
    ];

    let mut forward = serde_json::Map::new();
    for (key, node) in &fixture {
        forward.insert((*key).to_owned(), node.clone());
    }
    let mut reversed = serde_json::Map::new();
    for (key, node) in fixture.iter().rev() {
        reversed.insert((*key).to_owned(), node.clone());
    }

    let mapper = Mapper::new();
    let mut a: Vec<Sensor> = mapper.parse_list(&Value::Object(forward)).unwrap();
    let mut b: Vec<Sensor> = mapper.parse_list(&Value::Object(reversed)).unwrap();

    a.sort_by(|x, y| x.id.cmp(&y.id));
    b.sort_by(|x, y| x.id.cmp(&y.id));
    assert_eq!(a, b);

    // Each element's identity is its own sub-key.
    assert_eq!(a[0].id.as_deref(), Some("s1"));
    assert_eq!(a[1].id.as_deref(), Some("s2"));
}

// ============================================================================
// CONCURRENCY TESTS
// ============================================================================

#[test]
fn one_mapper_serves_concurrent_parses() {
    let mapper = Arc::new(Mapper::new());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let m = Arc::clone(&mapper);
            thread::spawn(move || {
                let key = format!("s{n}");
                let node = json!({ "kind": "temperature", "reading": f64::from(n) });
                let sensor: Sensor = m.parse_snapshot(&key, &node).unwrap();
                assert_eq!(sensor.id.as_deref(), Some(key.as_str()));
                m.serialize_snapshot(&sensor)
            })
        })
        .collect();

    for handle in handles {
        let node = handle.join().unwrap();
        assert!(node.contains_key("id"));
    }
}
