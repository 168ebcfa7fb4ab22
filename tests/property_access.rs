mod common;

use std::sync::Arc;

use common::*;
use ferrous_beans::{
    canonical_property_path, BeanWrapper, Class, ClassBuilder, ConversionError, Instance, PropertyAccessError,
    TypeDesc, Value,
};
use proptest::prelude::*;

fn wrapper() -> BeanWrapper {
    BeanWrapper::new(Instance::new(&test_bean_class(), TestBean::default()))
}

fn person(name: &str) -> Value {
    Value::Object(Instance::new(
        &test_bean_class(),
        TestBean {
            name: name.to_string(),
            ..TestBean::default()
        },
    ))
}

#[test]
fn nested_paths_read_and_write() {
    let w = wrapper();
    w.set_property_value("spouse", person("Kerry")).unwrap();
    w.set_property_value("spouse.age", Value::from("31")).unwrap();
    w.set_property_value("spouse.spouse", person("Rod")).unwrap();

    assert_eq!(w.get_property_value("spouse.name").unwrap(), Value::from("Kerry"));
    assert_eq!(w.get_property_value("spouse.age").unwrap(), Value::Int(31));
    assert_eq!(w.get_property_value("spouse.spouse.name").unwrap(), Value::from("Rod"));
    assert_eq!(w.property_type("spouse.age").unwrap(), TypeDesc::Int);
    assert!(w.is_readable_property("spouse.spouse.friends"));
    assert!(!w.is_readable_property("spouse.nothing"));
}

#[test]
fn null_nested_value_is_reported() {
    let w = wrapper();
    match w.set_property_value("spouse.name", Value::from("x")) {
        Err(PropertyAccessError::NullValueInNestedPath { property, bean_class }) => {
            assert_eq!(property, "spouse");
            assert_eq!(bean_class, "TestBean");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unknown_property_is_not_writable() {
    let w = wrapper();
    let err = w.set_property_value("spouse", person("a")).and_then(|_| {
        w.set_property_value("spouse.shoeSize", Value::Int(9))
    });
    match err {
        Err(PropertyAccessError::NotWritable { property, .. }) => assert_eq!(property, "spouse.shoeSize"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn list_elements_can_be_replaced_and_appended() {
    let w = wrapper();
    w.set_property_value("friends", Value::List(vec![Value::from("a"), Value::from("b")])).unwrap();
    w.set_property_value("friends[0]", Value::from("z")).unwrap();
    w.set_property_value("friends[2]", Value::from("c")).unwrap();

    assert_eq!(w.get_property_value("friends[0]").unwrap(), Value::from("z"));
    assert_eq!(w.get_property_value("friends[2]").unwrap(), Value::from("c"));
    match w.get_property_value("friends[3]") {
        Err(PropertyAccessError::InvalidPropertyPath { property, .. }) => assert_eq!(property, "friends[3]"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(w.set_property_value("friends[9]", Value::from("far")).is_err());
}

#[test]
fn map_entries_use_quoted_or_bare_keys() {
    let w = wrapper();
    w.set_property_value("settings['db.url']", Value::from("jdbc")).unwrap();
    w.set_property_value("settings[\"pool\"]", Value::Int(4)).unwrap();

    assert_eq!(w.get_property_value("settings[db.url]").unwrap(), Value::from("jdbc"));
    assert_eq!(w.get_property_value("settings['pool']").unwrap(), Value::Int(4));
    assert_eq!(w.get_property_value("settings[absent]").unwrap(), Value::Null);
}

#[test]
fn batch_update_collects_type_mismatches() {
    let w = wrapper();
    let result = w.set_property_values(
        vec![
            ("age", Value::from("old")),
            ("name", Value::from("kept")),
            ("spouse", Value::from("not a bean")),
        ],
        false,
    );
    match result {
        Err(PropertyAccessError::Aggregate(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(matches!(errors.error_for("age"), Some(PropertyAccessError::TypeMismatch { .. })));
            assert!(matches!(errors.error_for("spouse"), Some(PropertyAccessError::TypeMismatch { .. })));
            assert!(errors.error_for("name").is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(w.get_property_value("name").unwrap(), Value::from("kept"));
    assert_eq!(w.get_property_value("age").unwrap(), Value::Int(0));
}

/// Rejects negative limits from inside its setter.
#[derive(Default)]
struct Quota {
    limit: i64,
    owner: String,
}

fn quota_class() -> Arc<Class> {
    ClassBuilder::<Quota>::new("Quota")
        .default_constructor()
        .property("limit", |q: &Quota| q.limit, |q: &mut Quota, v: i64| {
            if v < 0 {
                return Err(format!("limit must not be negative, got {}", v));
            }
            q.limit = v;
            Ok(())
        })
        .property("owner", |q: &Quota| q.owner.clone(), |q: &mut Quota, v: String| q.owner = v)
        .build()
}

#[test]
fn failing_setter_is_a_method_invocation_error() {
    let w = BeanWrapper::new(Instance::new(&quota_class(), Quota::default()));
    match w.set_property_value("limit", Value::from("-3")) {
        Err(PropertyAccessError::MethodInvocation { property, value, source }) => {
            assert_eq!(property, "limit");
            assert_eq!(value, Value::from("-3"));
            assert_eq!(source.to_string(), "limit must not be negative, got -3");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(w.get_property_value("limit").unwrap(), Value::Int(0));
}

#[test]
fn batch_update_collects_failing_setters() {
    let w = BeanWrapper::new(Instance::new(&quota_class(), Quota::default()));
    let result = w.set_property_values(
        vec![("limit", Value::Int(-1)), ("owner", Value::from("ops"))],
        false,
    );
    match result {
        Err(PropertyAccessError::Aggregate(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(
                errors.error_for("limit"),
                Some(PropertyAccessError::MethodInvocation { .. })
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(w.get_property_value("owner").unwrap(), Value::from("ops"));
}

#[derive(Default)]
struct Family {
    kids: Vec<Instance>,
}

fn family_class() -> Arc<Class> {
    ClassBuilder::<Family>::new("Family")
        .default_constructor()
        .property_as(
            "kids",
            TypeDesc::array_of(TypeDesc::bean("ITestBean")),
            |f: &Family| f.kids.clone(),
            |f: &mut Family, v: Vec<Instance>| f.kids = v,
        )
        .build()
}

#[test]
fn nested_paths_step_through_list_elements() {
    let w = BeanWrapper::new(Instance::new(&family_class(), Family::default()));
    w.set_property_value("kids", Value::List(vec![person("Ann"), person("Ben")])).unwrap();
    w.set_property_value("kids[2]", person("Cal")).unwrap();
    w.set_property_value("kids[2].name", Value::from("Cleo")).unwrap();
    w.set_property_value("kids[0].age", Value::from("7")).unwrap();

    assert_eq!(w.get_property_value("kids[2].name").unwrap(), Value::from("Cleo"));
    assert_eq!(w.get_property_value("kids[0].age").unwrap(), Value::Int(7));
    assert_eq!(w.get_property_value("kids[1].name").unwrap(), Value::from("Ben"));
    match w.get_property_value("kids").unwrap() {
        Value::List(kids) => assert_eq!(kids.len(), 3),
        other => panic!("unexpected {other:?}"),
    }
    assert!(w.set_property_value("kids[4]", person("Dee")).is_err());
}

#[test]
fn batch_update_can_skip_unknown_properties() {
    let w = wrapper();
    w.set_property_values(vec![("bogus", Value::Int(1)), ("age", Value::Int(3))], true).unwrap();
    assert_eq!(w.get_property_value("age").unwrap(), Value::Int(3));
    assert!(matches!(
        w.set_property_values(vec![("bogus", Value::Int(1))], false),
        Err(PropertyAccessError::NotWritable { .. })
    ));
}

#[test]
fn custom_converters_apply_per_type_and_path() {
    let w = wrapper();
    w.register_converter(
        TypeDesc::Str,
        Arc::new(|text: &str| -> Result<Value, ConversionError> { Ok(Value::from(text.trim())) }),
    );
    w.register_converter_for_path(
        None,
        "age",
        Arc::new(|text: &str| -> Result<Value, ConversionError> {
            match text {
                "adult" => Ok(Value::Int(18)),
                other => Err(ConversionError::new(format!("unknown age '{}'", other))),
            }
        }),
    );

    w.set_property_value("name", Value::from("  padded  ")).unwrap();
    w.set_property_value("age", Value::from("adult")).unwrap();
    assert_eq!(w.get_property_value("name").unwrap(), Value::from("padded"));
    assert_eq!(w.get_property_value("age").unwrap(), Value::Int(18));
    assert!(matches!(
        w.set_property_value("age", Value::from("42")),
        Err(PropertyAccessError::TypeMismatch { .. })
    ));
}

#[test]
fn canonical_paths_strip_key_quotes() {
    assert_eq!(canonical_property_path("map['key']"), "map[key]");
    assert_eq!(canonical_property_path("a[\"b\"].c['d']"), "a[b].c[d]");
    assert_eq!(canonical_property_path("plain.path"), "plain.path");
}

proptest! {
    #[test]
    fn written_names_read_back(name in "[a-zA-Z0-9 ]{0,24}") {
        let w = wrapper();
        w.set_property_value("name", Value::from(name.as_str())).unwrap();
        prop_assert_eq!(w.get_property_value("name").unwrap(), Value::from(name.as_str()));
    }

    #[test]
    fn list_elements_read_back_by_index(items in proptest::collection::vec("[a-z]{1,8}", 1..8)) {
        let w = wrapper();
        let values: Vec<Value> = items.iter().map(|s| Value::from(s.as_str())).collect();
        w.set_property_value("friends", Value::List(values)).unwrap();
        for (index, item) in items.iter().enumerate() {
            prop_assert_eq!(w.get_property_value(&format!("friends[{}]", index)).unwrap(), Value::from(item.as_str()));
        }
        let past_end = format!("friends[{}]", items.len() + 1);
        prop_assert!(w.get_property_value(&past_end).is_err());
    }

    #[test]
    fn canonicalization_is_idempotent(
        key in "[a-z.]{1,6}",
        quote in prop::sample::select(vec!["", "'", "\""]),
    ) {
        let path = format!("settings[{quote}{key}{quote}]");
        let once = canonical_property_path(&path);
        prop_assert_eq!(canonical_property_path(&once), once.clone());
        prop_assert_eq!(once, format!("settings[{}]", key));
    }
}
