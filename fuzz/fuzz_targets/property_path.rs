#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_beans::{canonical_property_path, BeanWrapper, ClassBuilder, Instance, TypeDesc, Value, ValueMap};

#[derive(Default)]
struct Node {
    name: String,
    next: Option<Instance>,
    items: Vec<String>,
    entries: ValueMap,
}

fuzz_target!(|data: &[u8]| {
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };

    // Canonicalization must be stable on any input
    let canonical = canonical_property_path(path);
    assert_eq!(canonical_property_path(&canonical), canonical);

    let class = ClassBuilder::<Node>::new("Node")
        .default_constructor()
        .property("name", |n: &Node| n.name.clone(), |n: &mut Node, v: String| n.name = v)
        .property_as(
            "next",
            TypeDesc::bean("Node"),
            |n: &Node| n.next.clone(),
            |n: &mut Node, v: Option<Instance>| n.next = v,
        )
        .property("items", |n: &Node| n.items.clone(), |n: &mut Node, v: Vec<String>| n.items = v)
        .property("entries", |n: &Node| n.entries.clone(), |n: &mut Node, v: ValueMap| n.entries = v)
        .build();
    let child = Instance::new(&class, Node {
        items: vec!["a".into()],
        ..Node::default()
    });
    let wrapper = BeanWrapper::new(Instance::new(&class, Node {
        next: Some(child),
        ..Node::default()
    }));

    // Malformed paths must surface as errors, never panics
    let _ = wrapper.is_readable_property(path);
    let _ = wrapper.is_writable_property(path);
    let _ = wrapper.property_type(path);
    let _ = wrapper.get_property_value(path);
    let _ = wrapper.set_property_value(path, Value::from("x"));
});
