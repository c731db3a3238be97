#[path = "common/mod.rs"]
mod common;

use common::*;
use parmap::{BoundedParallelMapper, StaticArgs};

#[test]
fn typed_lookup_and_json_parsing() {
    let args = StaticArgs::from_json(r#"{"scale": 3, "a": 7, "b": 11, "label": "x"}"#).unwrap();
    assert_eq!(args.len(), 4);
    assert_eq!(args.require::<u64>("scale").unwrap(), 3);
    assert_eq!(args.get::<String>("label").unwrap().as_deref(), Some("x"));
    assert_eq!(args.get::<u64>("missing").unwrap(), None);
    assert_eq!(args.raw("label"), Some(&serde_json::json!("x")));
    assert_eq!(args.raw("missing"), None);
    assert!(args.require::<u64>("missing").is_err());
    assert!(args.get::<u64>("label").is_err(), "type mismatch is an error");
    assert_eq!(args.names().collect::<Vec<_>>(), vec!["a", "b", "label", "scale"]);

    assert!(StaticArgs::from_json("[1, 2]").is_err(), "only objects are accepted");
    assert!(StaticArgs::from_json("{oops").is_err());
}

#[test]
fn later_binding_replaces_earlier() {
    let args = StaticArgs::new().with("k", 1u32).unwrap().with("k", 2u32).unwrap();
    assert_eq!(args.len(), 1);
    assert_eq!(args.require::<u32>("k").unwrap(), 2);
}

/// The same bound arguments reach every invocation.
#[test]
fn every_invocation_sees_the_same_arguments() {
    let args = StaticArgs::from_json(r#"{"scale": 3, "a": 7, "b": 11}"#).unwrap();
    assert_eq!(args, affine_args());

    let mapper = BoundedParallelMapper::new().chunk_size(3).progress(false);
    let data = input(500);
    let out = mapper
        .map_ordered(
            |chunk: &[u64], a: &StaticArgs| -> anyhow::Result<Vec<u64>> {
                chunk.iter().map(|i| affine_item(i, a)).collect()
            },
            &args,
            &data,
        )
        .unwrap();

    assert_eq!(out, data.iter().map(|&i| affine(i)).collect::<Vec<_>>());
}
