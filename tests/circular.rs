mod common;

use common::*;
use ferrous_beans::{BeanDefinition, BeanFactory, BeansError, FactoryConfig};

fn couple(factory: &BeanFactory) {
    factory
        .register_bean_definition("tony", BeanDefinition::new("TestBean").property("name", "Tony").property_ref("spouse", "pepper"))
        .unwrap();
    factory
        .register_bean_definition("pepper", BeanDefinition::new("TestBean").property("name", "Pepper").property_ref("spouse", "tony"))
        .unwrap();
}

#[test]
fn property_cycle_between_singletons_resolves() {
    let factory = factory();
    couple(&factory);

    let tony = factory.get_bean("tony").unwrap();
    let pepper = factory.get_bean("pepper").unwrap();
    assert!(spouse_of(&tony).unwrap().ptr_eq(&pepper));
    assert!(spouse_of(&pepper).unwrap().ptr_eq(&tony));
    assert_eq!(name_of(&spouse_of(&pepper).unwrap()), "Tony");
    assert_eq!(factory.get_singleton_names(), vec!["pepper".to_string(), "tony".to_string()]);
}

#[test]
fn bean_may_reference_itself() {
    let factory = factory();
    factory
        .register_bean_definition("narcissus", BeanDefinition::new("TestBean").property_ref("spouse", "narcissus"))
        .unwrap();
    let bean = factory.get_bean("narcissus").unwrap();
    assert!(spouse_of(&bean).unwrap().ptr_eq(&bean));
}

#[test]
fn cycle_fails_when_early_exposure_is_disabled() {
    let factory = BeanFactory::with_config(FactoryConfig::new().with_circular_references(false));
    register_fixtures(&factory);
    couple(&factory);

    let err = factory.get_bean("tony").unwrap_err();
    assert!(matches!(
        err.root_bean_error(),
        BeansError::BeanCurrentlyInCreation { bean_name } if bean_name == "tony"
    ));
    assert_eq!(factory.get_singleton_count(), 0);
}

#[test]
fn prototype_requiring_itself_fails() {
    let factory = factory();
    factory
        .register_bean_definition("echo", BeanDefinition::new("TestBean").prototype().property_ref("spouse", "echo"))
        .unwrap();
    let err = factory.get_bean("echo").unwrap_err();
    assert!(matches!(err.root_bean_error(), BeansError::BeanCurrentlyInCreation { .. }));
    assert_eq!(factory.creation_depth(), 0);
}

#[test]
fn prototype_may_reference_singleton_that_references_it() {
    let factory = factory();
    factory
        .register_bean_definition("owner", BeanDefinition::new("TestBean").property_ref("spouse", "guest"))
        .unwrap();
    factory
        .register_bean_definition("guest", BeanDefinition::new("TestBean").prototype().property_ref("spouse", "owner"))
        .unwrap();

    let owner = factory.get_bean("owner").unwrap();
    let guest = spouse_of(&owner).unwrap();
    assert!(spouse_of(&guest).unwrap().ptr_eq(&owner));
    assert!(!factory.get_bean("guest").unwrap().ptr_eq(&guest));
}

#[test]
fn creation_depth_is_bounded() {
    let factory = BeanFactory::with_config(FactoryConfig::new().with_max_creation_depth(3));
    register_fixtures(&factory);
    for (name, next) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")] {
        factory
            .register_bean_definition(name, BeanDefinition::new("TestBean").prototype().property_ref("spouse", next))
            .unwrap();
    }
    factory.register_bean_definition("e", BeanDefinition::new("TestBean").prototype()).unwrap();

    let err = factory.get_bean("a").unwrap_err();
    match err.root_bean_error() {
        BeansError::BeanCreation { bean_name, message, .. } => {
            assert_eq!(bean_name, "d");
            assert_eq!(message, "Maximum bean creation depth of 3 exceeded: a -> b -> c -> d");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(factory.get_bean("c").is_ok());
}
