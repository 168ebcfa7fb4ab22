#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_beans::{ConverterRegistry, TypeDesc, Value};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let Ok(text) = std::str::from_utf8(&data[1..]) else {
        return;
    };

    let required = match data[0] % 9 {
        0 => TypeDesc::Bool,
        1 => TypeDesc::Int,
        2 => TypeDesc::Float,
        3 => TypeDesc::Path,
        4 => TypeDesc::Url,
        5 => TypeDesc::Class,
        6 => TypeDesc::array_of(TypeDesc::Int),
        7 => TypeDesc::Map(Box::new(TypeDesc::Str)),
        _ => TypeDesc::bean("Missing"),
    };

    let converters = ConverterRegistry::new();
    if let Ok(value) = converters.convert_if_necessary(None, Value::from(text), &required) {
        assert!(required.accepts(&value));
    }
});
