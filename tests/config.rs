use std::env;

use ferrous_beans::{
    BeanDefinition, BeanFactory, BeansError, ConfigProvider, ConfigValue, FactoryConfig, MapConfigSource,
};
use serial_test::serial;

#[test]
fn defaults() {
    let config = FactoryConfig::default();
    assert!(config.allow_bean_definition_overriding);
    assert!(config.allow_circular_references);
    assert_eq!(config.max_creation_depth, 512);
}

#[test]
fn earlier_sources_win() {
    let mut provider = ConfigProvider::new();
    provider.add_source(Box::new(
        MapConfigSource::new().with("allow_overriding", ConfigValue::String("no".into())),
    ));
    provider.add_source(Box::new(
        MapConfigSource::new()
            .with("allow_overriding", ConfigValue::Boolean(true))
            .with("max_creation_depth", ConfigValue::Integer(16)),
    ));

    let config = FactoryConfig::load(&provider).unwrap();
    assert!(!config.allow_bean_definition_overriding);
    assert_eq!(config.max_creation_depth, 16);
    assert!(config.allow_circular_references);
}

#[test]
fn malformed_values_are_rejected() {
    let mut provider = ConfigProvider::new();
    provider.add_source(Box::new(
        MapConfigSource::new().with("max_creation_depth", ConfigValue::Integer(-1)),
    ));
    let err = FactoryConfig::load(&provider).unwrap_err();
    assert_eq!(err.key, "max_creation_depth");
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    env::set_var("FERROUS_BEANS_ALLOW_OVERRIDING", "false");
    env::set_var("FERROUS_BEANS_MAX_CREATION_DEPTH", "8");
    let config = FactoryConfig::from_env();
    env::remove_var("FERROUS_BEANS_ALLOW_OVERRIDING");
    env::remove_var("FERROUS_BEANS_MAX_CREATION_DEPTH");

    let config = config.unwrap();
    assert!(!config.allow_bean_definition_overriding);
    assert_eq!(config.max_creation_depth, 8);

    let factory = BeanFactory::with_config(config);
    factory.register_bean_definition("a", BeanDefinition::new("A")).unwrap();
    assert!(matches!(
        factory.register_bean_definition("a", BeanDefinition::new("B")),
        Err(BeansError::BeanDefinitionStore { .. })
    ));
}

#[test]
#[serial]
fn bad_environment_value_is_an_error() {
    env::set_var("FERROUS_BEANS_ALLOW_CIRCULAR_REFERENCES", "maybe");
    let result = FactoryConfig::from_env();
    env::remove_var("FERROUS_BEANS_ALLOW_CIRCULAR_REFERENCES");
    assert_eq!(result.unwrap_err().key, "allow_circular_references");
}

#[cfg(feature = "config")]
#[test]
fn json_keeps_defaults_for_missing_fields() {
    let config = FactoryConfig::from_json(r#"{ "allow_circular_references": false }"#).unwrap();
    assert!(!config.allow_circular_references);
    assert!(config.allow_bean_definition_overriding);
    assert_eq!(config.max_creation_depth, 512);
}
