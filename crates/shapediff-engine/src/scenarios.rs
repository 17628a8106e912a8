//! End-to-end comparisons of reflected types.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use shapediff_types::{reflect_struct, Change, ChangeLog, ChangeType, Reflect, Shape, Value};

use crate::{DiffError, Differ, Registry};

#[derive(Clone, Default)]
struct Record {
    id: i64,
    name: String,
    scratch_pad: String,
    time: Option<DateTime<Utc>>,
}

reflect_struct!(Record {
    id,
    name,
    scratch_pad [diff = "-"],
    time,
});

struct Nested {
    record: Record,
}

reflect_struct!(Nested { record });

#[derive(Default)]
struct Repeated {
    id: i64,
    nums: Vec<i64>,
    records: Vec<Option<Record>>,
    ifs: Vec<Value>,
    map: BTreeMap<String, Value>,
}

reflect_struct!(Repeated {
    id [diff = "name=ID"],
    nums,
    records,
    ifs,
    map,
});

struct Nums {
    ints: Vec<i64>,
    numerics: Vec<f32>,
}

reflect_struct!(Nums {
    ints [diff = "sort=true"],
    numerics [diff = "indexBy=."],
});

struct Dynamic {
    value: Value,
}

reflect_struct!(Dynamic { value });

struct Credentials {
    user: String,
    secret: String,
}

reflect_struct!(Credentials {
    user,
    secret [audit = "-"],
});

struct Lists {
    list: String,
}

reflect_struct!(Lists {
    list [diff = "itemSeparator=$coma"],
});

#[derive(Default)]
struct Exprs {
    expr: String,
    expr_list: String,
}

reflect_struct!(Exprs {
    expr [diff = "pairdelimiter=AND|OR,pairSeparator=:,whitespace=]|[|\""],
    expr_list [diff = "pairdelimiter=AND|OR,pairSeparator=:,whitespace=]|[|\",itemSeparator=$coma,indexBy=."],
});

struct PresRecordHas {
    id: bool,
    name: bool,
    scratch_pad: bool,
    time: bool,
}

reflect_struct!(PresRecordHas {
    id,
    name,
    scratch_pad,
    time,
});

struct PresRecord {
    id: i64,
    name: String,
    scratch_pad: String,
    time: Option<DateTime<Utc>>,
    has: Option<PresRecordHas>,
}

reflect_struct!(PresRecord {
    id,
    name,
    scratch_pad [diff = "-"],
    time,
    has [diff = "presence=true"],
});

struct Chain {
    id: i64,
    next: Option<Box<Chain>>,
}

reflect_struct!(Chain { id, next });

struct BadTag {
    amount: f64,
}

reflect_struct!(BadTag {
    amount [diff = "precision=high"],
});

struct BadIndex {
    rows: Vec<Record>,
}

reflect_struct!(BadIndex {
    rows [diff = "indexBy=missing"],
});

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn record(id: i64, name: &str) -> Record {
    Record {
        id,
        name: name.to_string(),
        ..Record::default()
    }
}

fn summary(log: &ChangeLog) -> Vec<String> {
    log.iter()
        .map(|change| match change {
            Change::Create { path, to } => format!("create {path} {to}"),
            Change::Update { path, from, to } => format!("update {path} {from} -> {to}"),
            Change::Delete { path, from } => format!("delete {path} {from}"),
            Change::Error { path, message } => format!("error {path} {message}"),
        })
        .collect()
}

fn paths(log: &ChangeLog) -> Vec<String> {
    log.iter().map(|c| c.path().to_string()).collect()
}

#[test]
fn record_delete_update_create() {
    let differ = Differ::for_types::<Record, Record>().unwrap();

    let from = Record {
        scratch_pad: "notes".into(),
        ..record(1, "a")
    };
    let log = differ.diff::<Record, Record>(Some(&from), None);
    assert_eq!(paths(&log), ["id", "name"]);
    assert_eq!(log.deletes(), 2);

    let to = Record {
        id: 2,
        scratch_pad: "other notes".into(),
        time: Some(at(9)),
        ..record(1, "a")
    };
    let log = differ.diff(Some(&from), Some(&to));
    assert_eq!(paths(&log), ["id", "time"]);
    assert_eq!(log.updates(), 2);
    assert_eq!(log.changes()[1].from(), Some(&Value::Null));
    assert_eq!(log.changes()[1].to(), Some(&Value::Time(at(9))));

    let log = differ.diff::<Record, Record>(None, Some(&record(1, "")));
    assert_eq!(summary(&log), ["create id 1"]);
}

#[test]
fn identical_values_produce_nothing() {
    let differ = Differ::for_types::<Record, Record>().unwrap();
    let value = Record {
        time: Some(at(3)),
        ..record(5, "same")
    };
    assert!(differ.diff(Some(&value), Some(&value)).is_empty());
}

#[test]
fn nested_struct_paths() {
    let differ = Differ::for_types::<Nested, Nested>().unwrap();
    let from = Nested {
        record: record(1, "a"),
    };
    let to = Nested {
        record: record(2, "b"),
    };
    let log = differ.diff(Some(&from), Some(&to));
    assert_eq!(paths(&log), ["record.id", "record.name"]);
}

#[test]
fn repeated_fields_update() {
    let differ = Differ::for_types::<Repeated, Repeated>().unwrap();
    let from = Repeated {
        id: 1,
        nums: vec![10, 2],
        records: vec![Some(record(12, ""))],
        ..Repeated::default()
    };
    let to = Repeated {
        id: 1,
        records: vec![Some(record(23, ""))],
        ..Repeated::default()
    };
    let log = differ.diff(Some(&from), Some(&to));
    assert_eq!(
        summary(&log),
        [
            "delete nums[0] 10",
            "delete nums[1] 2",
            "update records[0].id 12 -> 23",
        ]
    );
}

#[test]
fn repeated_fields_delete() {
    let differ = Differ::for_types::<Repeated, Repeated>().unwrap();
    let from = Repeated {
        records: vec![Some(record(23, ""))],
        ..Repeated::default()
    };
    let log = differ.diff(Some(&from), Some(&Repeated::default()));
    assert_eq!(summary(&log), ["delete records[0].id 23"]);
}

#[test]
fn renamed_field_reports_new_name() {
    let differ = Differ::for_types::<Repeated, Repeated>().unwrap();
    let from = Repeated {
        id: 1,
        ..Repeated::default()
    };
    let to = Repeated {
        id: 2,
        ..Repeated::default()
    };
    assert_eq!(paths(&differ.diff(Some(&from), Some(&to))), ["ID"]);
}

#[test]
fn sorted_ints() {
    let differ = Differ::for_types::<Nums, Nums>().unwrap();
    let from = Nums {
        ints: vec![4, 6, 1],
        numerics: vec![],
    };
    let to = Nums {
        ints: vec![1, 6, 4, 7],
        numerics: vec![],
    };
    assert_eq!(summary(&differ.diff(Some(&from), Some(&to))), ["create ints[3] 7"]);
}

#[test]
fn indexed_floats() {
    let differ = Differ::for_types::<Nums, Nums>().unwrap();
    let from = Nums {
        ints: vec![],
        numerics: vec![4.0, 6.0, 1.0],
    };
    let to = Nums {
        ints: vec![],
        numerics: vec![1.0, 2.0, 6.0, 4.0],
    };
    let log = differ.diff(Some(&from), Some(&to));
    assert_eq!(paths(&log), ["numerics[1]"]);
    assert_eq!(log.changes()[0].change_type(), Some(ChangeType::Create));
    assert_eq!(log.changes()[0].to(), Some(&Value::Float(2.0)));
}

#[test]
fn dynamic_field_resolves_record() {
    let differ = Differ::for_types::<Dynamic, Dynamic>().unwrap();
    let from = Dynamic {
        value: record(1, "a").to_value(),
    };
    let to = Dynamic {
        value: record(1, "b").to_value(),
    };
    assert_eq!(summary(&differ.diff(Some(&from), Some(&to))), ["update value.name a -> b"]);
}

#[test]
fn shared_registry_keeps_configurations_apart() {
    let registry = Arc::new(Registry::new());
    let plain = Differ::builder()
        .registry(Arc::clone(&registry))
        .build_for::<Dynamic, Dynamic>()
        .unwrap();
    let audited = Differ::builder()
        .tag_name("audit")
        .registry(Arc::clone(&registry))
        .build_for::<Dynamic, Dynamic>()
        .unwrap();
    let credentials = |secret: &str| Dynamic {
        value: Credentials {
            user: "u".into(),
            secret: secret.into(),
        }
        .to_value(),
    };
    let (from, to) = (credentials("a"), credentials("b"));

    assert_eq!(
        summary(&plain.diff(Some(&from), Some(&to))),
        ["update value.secret a -> b"]
    );
    assert!(audited.diff(Some(&from), Some(&to)).is_empty());
    assert_eq!(registry.len(), 2);
}

#[test]
fn dynamic_field_changing_kind_replaces_value() {
    let differ = Differ::for_types::<Dynamic, Dynamic>().unwrap();
    let from = Dynamic {
        value: record(1, "a").to_value(),
    };
    let to = Dynamic {
        value: Value::from("flat"),
    };
    let log = differ.diff(Some(&from), Some(&to));
    assert_eq!(paths(&log), ["value"]);
    assert_eq!(log.updates(), 1);
}

#[test]
fn dynamic_slice_elements() {
    let differ = Differ::for_types::<Repeated, Repeated>().unwrap();
    let from = Repeated {
        ifs: vec![record(1, "a").to_value()],
        ..Repeated::default()
    };
    let to = Repeated {
        ifs: vec![record(1, "b").to_value()],
        ..Repeated::default()
    };
    assert_eq!(paths(&differ.diff(Some(&from), Some(&to))), ["ifs[0].name"]);
}

#[test]
fn map_entries() {
    let differ = Differ::for_types::<Repeated, Repeated>().unwrap();
    let entries = |second: &str| -> BTreeMap<String, Value> {
        [
            ("k1".to_string(), Value::Int(1)),
            ("k2".to_string(), Value::from(second)),
        ]
        .into_iter()
        .collect()
    };
    let from = Repeated {
        map: entries("a"),
        ..Repeated::default()
    };
    let to = Repeated {
        map: entries("b"),
        ..Repeated::default()
    };
    assert_eq!(summary(&differ.diff(Some(&from), Some(&to))), ["update map[k2] a -> b"]);

    let mut fewer = entries("a");
    fewer.remove("k1");
    let to = Repeated {
        map: fewer,
        ..Repeated::default()
    };
    assert_eq!(summary(&differ.diff(Some(&from), Some(&to))), ["delete map[k1] 1"]);
}

#[test]
fn item_separated_string() {
    let differ = Differ::for_types::<Lists, Lists>().unwrap();
    let from = Lists {
        list: "1,2,3".into(),
    };
    let to = Lists {
        list: "1,2,4".into(),
    };
    assert_eq!(summary(&differ.diff(Some(&from), Some(&to))), ["update list[2] 3 -> 4"]);
}

#[test]
fn pair_delimited_string() {
    let differ = Differ::for_types::<Exprs, Exprs>().unwrap();
    let from = Exprs {
        expr: "k1:v1 AND k2:v2 OR k3:v3".into(),
        ..Exprs::default()
    };
    let to = Exprs {
        expr: "k1:v1 AND k2:v2 OR k3:v3.1 AND k4:v4".into(),
        ..Exprs::default()
    };
    assert_eq!(
        summary(&differ.diff(Some(&from), Some(&to))),
        ["update expr[k3] v3 -> v3.1", "create expr[k4] v4"]
    );
}

#[test]
fn pair_delimited_lists() {
    let differ = Differ::for_types::<Exprs, Exprs>().unwrap();
    let from = Exprs {
        expr_list: r#"k1:[1,2] AND k2:["v2"] "#.into(),
        ..Exprs::default()
    };
    let to = Exprs {
        expr_list: r#"k1:[0,1] AND k2:["v2"]"#.into(),
        ..Exprs::default()
    };
    assert_eq!(
        summary(&differ.diff(Some(&from), Some(&to))),
        ["delete expr_list[k1][1] 2", "create expr_list[k1][0] 0"]
    );
}

#[test]
fn decoding_non_string_is_an_error() {
    let shape = Shape::Scalar(shapediff_types::ScalarKind::String);
    let differ = Differ::builder()
        .tag(crate::Tag::parse("itemSeparator=;").unwrap())
        .build(Some(&shape), None)
        .unwrap();
    let log = differ.diff_values(&Value::Int(1), &Value::from("a;b"));
    assert_eq!(log.errors(), 1);
}

#[test]
fn presence_limits_compared_fields() {
    let differ = Differ::builder()
        .presence(true)
        .build_for::<PresRecord, PresRecord>()
        .unwrap();
    let from = PresRecord {
        id: 1,
        name: "a".into(),
        scratch_pad: String::new(),
        time: Some(at(1)),
        has: Some(PresRecordHas {
            id: true,
            name: true,
            scratch_pad: true,
            time: true,
        }),
    };
    let to = PresRecord {
        id: 2,
        name: "b".into(),
        scratch_pad: String::new(),
        time: Some(at(2)),
        has: Some(PresRecordHas {
            id: false,
            name: true,
            scratch_pad: false,
            time: false,
        }),
    };
    assert_eq!(summary(&differ.diff(Some(&from), Some(&to))), ["update name a -> b"]);

    let unchecked = Differ::for_types::<PresRecord, PresRecord>().unwrap();
    assert_eq!(paths(&unchecked.diff(Some(&from), Some(&to))), ["id", "name", "time"]);
}

#[test]
fn self_referential_chain() {
    let differ = Differ::for_types::<Chain, Chain>().unwrap();
    let chain = |last: i64| Chain {
        id: 1,
        next: Some(Box::new(Chain {
            id: 2,
            next: Some(Box::new(Chain { id: last, next: None })),
        })),
    };
    let log = differ.diff(Some(&chain(3)), Some(&chain(4)));
    assert_eq!(summary(&log), ["update next.next.id 3 -> 4"]);

    let log = differ.diff::<Chain, Chain>(None, Some(&chain(3)));
    assert_eq!(paths(&log), ["id", "next.id", "next.next.id"]);
}

#[test]
fn depth_limit_stops_construction() {
    let result = Differ::builder().max_depth(1).build_for::<Nested, Nested>();
    assert!(matches!(result, Err(DiffError::CyclicSchema { depth: 1, .. })));
}

#[test]
fn incompatible_shapes_fail_construction() {
    let result = Differ::new(Some(&Record::shape()), Some(&String::shape()));
    assert!(matches!(result, Err(DiffError::IncompatibleShapes { .. })));
}

#[test]
fn invalid_tags_fail_construction() {
    assert!(matches!(
        Differ::for_types::<BadTag, BadTag>(),
        Err(DiffError::InvalidTag { .. })
    ));
    assert!(matches!(
        Differ::for_types::<BadIndex, BadIndex>(),
        Err(DiffError::UnknownIndexField { .. })
    ));
}

#[test]
fn change_records_export() {
    let differ = Differ::for_types::<Record, Record>().unwrap();
    let log = differ.diff(Some(&record(1, "a")), Some(&record(2, "a")));
    let records = log.to_change_records("orders", "42");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "id");
    assert_eq!(records[0].change, "update");
    assert_eq!(records[0].from, Some(serde_json::json!(1)));
    assert_eq!(records[0].to, Some(serde_json::json!(2)));

    let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
    assert_eq!(json[0]["sourceID"], "42");
}

fn dynamic_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

proptest! {
    #[test]
    fn diff_with_itself_is_empty(value in dynamic_value()) {
        let differ = Differ::new(Some(&Shape::Dynamic), None).unwrap();
        let log = differ.diff_values(&value, &value);
        prop_assert!(log.is_empty(), "unexpected changes: {:?}", log.changes());
    }
}
