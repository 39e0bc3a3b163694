use mongofake::bson::{Bson, doc};
use mongofake::prelude::*;
use serde::{Deserialize, Serialize};

fn client() -> Client {
    Client::with_uri("mongodb://localhost:27017").unwrap()
}

fn values(cursor: Cursor) -> Vec<i32> {
    cursor.map(|doc| doc.get_i32("v").unwrap()).collect()
}

#[test]
fn insert_then_find_by_identifier_returns_an_equal_copy() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("things");

    let id = collection.insert_one(doc! { "name": "widget", "tags": ["a", "b"] }).unwrap();
    let found = collection.find_one(Selector::id(id.clone())).unwrap().unwrap();
    assert_eq!(found, doc! { "_id": id.clone(), "name": "widget", "tags": ["a", "b"] });

    collection
        .update(&doc! { "_id": id.clone() }, &doc! { "$set": { "name": "gadget" } }, false, false)
        .unwrap();
    assert_eq!(found.get_str("name").unwrap(), "widget");
}

#[test]
fn collection_names_and_documents_keep_insertion_order() {
    let mut client = client();
    let database = client.database("app").unwrap();
    for name in ["c", "a", "b"] {
        database.collection(name);
    }
    database.drop_collection("a");
    database.collection("c");
    assert_eq!(database.collection_names(), ["c", "b"]);

    let collection = database.collection("ordered");
    for v in [3, 1, 2] {
        collection.insert_one(doc! { "_id": v, "v": v }).unwrap();
    }
    collection.remove(Selector::id(1)).unwrap();
    collection.insert_one(doc! { "_id": 1, "v": 1 }).unwrap();
    collection.insert_one(doc! { "_id": 3, "v": 3 }).unwrap();

    assert_eq!(values(collection.find(&doc! {}, FindOptions::new()).unwrap()), vec![3, 2, 1]);
}

#[test]
fn partial_merge_changes_named_fields_only() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("merge");
    collection.insert_one(doc! { "_id": "x", "a": 1, "b": 2 }).unwrap();

    let result = collection
        .update(&doc! { "_id": "x" }, &doc! { "$set": { "a": 9 } }, false, false)
        .unwrap();

    assert_eq!(result.to_document().unwrap().get_bool("updatedExisting").unwrap(), true);
    assert_eq!(
        collection.find_one(Selector::id("x")).unwrap().unwrap(),
        doc! { "_id": "x", "a": 9, "b": 2 }
    );
}

#[test]
fn multi_flag_controls_how_many_documents_update() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("multi");
    collection
        .insert_many((0..4).map(|i| doc! { "_id": i, "group": "g", "touched": false }))
        .unwrap();

    let single = collection
        .update(&doc! { "group": "g" }, &doc! { "$set": { "touched": true } }, false, false)
        .unwrap();
    assert_eq!(single.n, 1);
    assert_eq!(collection.find(&doc! { "touched": true }, FindOptions::new()).unwrap().count(), 1);
    assert_eq!(collection.find_one(Selector::id(0)).unwrap().unwrap().get_bool("touched").unwrap(), true);

    let multi = collection
        .update(&doc! { "group": "g" }, &doc! { "$set": { "touched": true } }, false, true)
        .unwrap();
    assert_eq!(multi.n, 4);
    assert_eq!(collection.find(&doc! { "touched": true }, FindOptions::new()).unwrap().count(), 4);
}

#[test]
fn comparison_operators_select_expected_documents() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("ops");
    collection
        .insert_many(vec![doc! { "v": 1 }, doc! { "v": 5 }, doc! { "v": 10 }])
        .unwrap();

    let find = |spec| values(collection.find(&spec, FindOptions::new()).unwrap());

    assert_eq!(find(doc! { "v": { "$gte": 5 } }), vec![5, 10]);
    assert_eq!(find(doc! { "v": { "$in": [1, 10] } }), vec![1, 10]);
    assert_eq!(find(doc! { "v": { "$nin": [1, 10] } }), vec![5]);
    assert_eq!(find(doc! { "v": { "$gt": 1, "$lt": 10 } }), vec![5]);
    assert_eq!(find(doc! { "v": { "$ne": 5 } }), vec![1, 10]);
    assert_eq!(find(doc! { "v": { "$exists": true } }), vec![1, 5, 10]);
    assert_eq!(find(doc! { "w": { "$exists": false } }), Vec::<i32>::new());
    assert_eq!(find(doc! { "v": 5.0 }), vec![5]);
}

#[test]
fn absent_fields_never_match_operators() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("absent");
    collection
        .insert_many(vec![doc! { "v": 1 }, doc! { "v": 2, "w": 1 }])
        .unwrap();

    let find = |spec| values(collection.find(&spec, FindOptions::new()).unwrap());

    assert_eq!(find(doc! { "w": { "$exists": false } }), Vec::<i32>::new());
    assert_eq!(find(doc! { "w": { "$exists": true } }), vec![2]);
    assert_eq!(find(doc! { "w": { "$ne": 7 } }), vec![2]);
}

#[test]
fn nested_paths_and_array_operators() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("nested");
    collection
        .insert_many(vec![
            doc! { "v": 1, "meta": { "tags": ["x", "y"], "size": 3 } },
            doc! { "v": 2, "meta": { "tags": ["y"], "size": 7 } },
            doc! { "v": 3 },
        ])
        .unwrap();

    let find = |spec| values(collection.find(&spec, FindOptions::new()).unwrap());

    assert_eq!(find(doc! { "meta.size": 7 }), vec![2]);
    assert_eq!(find(doc! { "meta.size": { "$lte": 7 } }), vec![1, 2]);
    assert_eq!(find(doc! { "meta.tags": { "$all": ["x", "y"] } }), vec![1]);
    assert_eq!(find(doc! { "meta.tags.0": "y" }), vec![2]);
    assert_eq!(find(doc! { "meta.missing": Bson::Null }), Vec::<i32>::new());
}

#[test]
fn skip_and_limit_compose_on_the_established_order() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("paging");
    collection
        .insert_many((1..=5).rev().map(|v| doc! { "v": v }))
        .unwrap();

    let unsorted = collection.find(&doc! {}, FindOptions::new()).unwrap().skip(1).limit(2);
    assert_eq!(values(unsorted), vec![4, 3]);

    let sorted = collection
        .find(&doc! {}, FindOptions::builder().sort("v", SortDirection::Asc).build())
        .unwrap()
        .skip(1)
        .limit(2);
    assert_eq!(sorted.count_documents(true), 2);
    assert_eq!(sorted.count_documents(false), 5);
    assert_eq!(values(sorted), vec![2, 3]);

    let unlimited = collection.find(&doc! {}, FindOptions::builder().limit(0).build()).unwrap();
    assert_eq!(unlimited.count_documents(true), 5);
    let emptied = collection.find(&doc! {}, FindOptions::new()).unwrap().limit(0);
    assert_eq!(values(emptied), Vec::<i32>::new());
}

#[test]
fn set_with_huge_array_index_fails_without_changes() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("arrays");
    collection.insert_one(doc! { "_id": 1, "list": [1, 2] }).unwrap();

    let result = collection.update(
        &doc! { "_id": 1 },
        &doc! { "$set": { "list.18446744073709551615": 1 } },
        false,
        false,
    );
    assert!(matches!(result, Err(MongoFakeError::InvalidDocument(_))));
    assert_eq!(collection.find_one(Selector::id(1)).unwrap().unwrap(), doc! { "_id": 1, "list": [1, 2] });
}

#[test]
fn remove_by_identifier_is_exact_and_quiet_on_misses() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("removal");
    let ids = collection
        .insert_many(vec![doc! { "v": 1 }, doc! { "v": 2 }])
        .unwrap();

    let Bson::ObjectId(first) = ids[0] else {
        panic!("expected a generated ObjectId");
    };
    let removed = collection.remove(first).unwrap();
    assert_eq!(removed.n, 1);
    assert_eq!(removed.to_document().unwrap().get_str("serverUsed").unwrap(), "localhost:27017");
    assert_eq!(collection.count(), 1);

    assert_eq!(collection.remove(first).unwrap().n, 0);
    assert_eq!(collection.count(), 1);
}

#[test]
fn dropped_database_comes_back_empty() {
    let mut client = client();
    client.database("gone").unwrap().collection("c").insert_one(doc! { "v": 1 }).unwrap();
    client.database("gone").unwrap().collection("d").insert_one(doc! { "v": 2 }).unwrap();

    assert!(client.drop_database("gone"));

    let database = client.database("gone").unwrap();
    assert!(database.collection_names().is_empty());
    assert_eq!(database.collection("c").count(), 0);
}

#[test]
fn upsert_and_save_report_identifiers() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("upserts");

    let result = collection
        .update(&doc! { "_id": "k" }, &doc! { "v": 1 }, true, false)
        .unwrap();
    assert_eq!(result.upserted, Some(Bson::String("k".into())));
    assert_eq!(collection.find_one(Selector::id("k")).unwrap().unwrap(), doc! { "_id": "k", "v": 1 });

    let saved = collection.save(doc! { "_id": "k", "v": 2 }).unwrap();
    assert_eq!(saved, Bson::String("k".into()));
    assert_eq!(collection.count(), 1);
    assert_eq!(collection.find_one(Selector::All).unwrap().unwrap().get_i32("v").unwrap(), 2);
}

#[test]
fn malformed_requests_fail_before_touching_data() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("errors");
    collection.insert_one(doc! { "_id": 1, "v": 1 }).unwrap();

    assert!(matches!(
        collection.find(&doc! { "$where": "true" }, FindOptions::new()),
        Err(MongoFakeError::UnsupportedOperator(_))
    ));
    assert!(matches!(
        collection.find(&doc! { "v": { "$in": 1 } }, FindOptions::new()),
        Err(MongoFakeError::InvalidQuery(_))
    ));
    assert!(matches!(
        collection.update(&doc! { "_id": 1 }, &doc! { "$inc": { "v": 1 } }, false, false),
        Err(MongoFakeError::UnsupportedOperator(_))
    ));
    assert!(matches!(
        collection.update(&doc! { "_id": 1 }, &doc! { "$set": 5 }, false, false),
        Err(MongoFakeError::InvalidArgument(_))
    ));

    assert_eq!(collection.find_one(Selector::id(1)).unwrap().unwrap(), doc! { "_id": 1, "v": 1 });
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    value: f64,
}

#[test]
fn typed_and_json_documents() {
    let mut client = client();
    let collection = client.database("app").unwrap().collection("readings");

    collection.insert_typed(&Reading { sensor: "t1".into(), value: 21.5 }).unwrap();
    let from_json = document_from_json(&serde_json::json!({ "sensor": "t2", "value": 19.0 })).unwrap();
    collection.insert_one(from_json).unwrap();

    let options = FindOptions::builder()
        .projection(["sensor", "value"])
        .sort("value", SortDirection::Asc)
        .build();
    let mut cursor = collection.find(&doc! {}, options).unwrap();

    let coldest = cursor.next().unwrap();
    let json = document_to_json(&coldest).unwrap();
    assert_eq!(json["sensor"], "t2");

    let warmest = cursor.next_as::<Reading>().unwrap().unwrap();
    assert_eq!(warmest, Reading { sensor: "t1".into(), value: 21.5 });
    assert!(cursor.next().is_none());
}

#[test]
fn deterministic_object_ids() {
    let from_secs = object_id_from_secs(1_700_000_000);
    let from_str = object_id_from_time_str("2023-11-14 22:13:20", "%Y-%m-%d %H:%M:%S").unwrap();

    assert_eq!(from_secs, from_str);
    assert_eq!(&from_secs.bytes()[..4], &1_700_000_000_u32.to_be_bytes());
    assert!(object_id_from_secs(1).bytes() < object_id_from_secs(2).bytes());
}
