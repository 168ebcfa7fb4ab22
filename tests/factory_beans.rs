mod common;

use common::*;
use ferrous_beans::{BeanDefinition, BeansError, TypeDesc, FACTORY_BEAN_PREFIX};

#[test]
fn product_is_returned_unless_dereferenced() {
    let factory = factory();
    factory
        .register_bean_definition("tbf", BeanDefinition::new("TestBeanFactory").property("name", "made"))
        .unwrap();

    let product = factory.get_bean("tbf").unwrap();
    assert_eq!(product.class().name(), "TestBean");
    assert_eq!(name_of(&product), "made");
    assert!(factory.get_bean("tbf").unwrap().ptr_eq(&product));

    let own = factory.get_bean(&format!("{}tbf", FACTORY_BEAN_PREFIX)).unwrap();
    assert_eq!(own.class().name(), "TestBeanFactory");
    assert!(factory.is_singleton("tbf").unwrap());
}

#[test]
fn prototype_products_are_fresh() {
    let factory = factory();
    factory
        .register_bean_definition("ptbf", BeanDefinition::new("PrototypeTestBeanFactory").property("name", "each"))
        .unwrap();

    let first = factory.get_bean("ptbf").unwrap();
    let second = factory.get_bean("ptbf").unwrap();
    assert!(!first.ptr_eq(&second));
    assert!(!factory.is_singleton("ptbf").unwrap());
    assert!(factory.is_singleton("&ptbf").unwrap());
    assert!(factory.get_bean("&ptbf").unwrap().ptr_eq(&factory.get_bean("&ptbf").unwrap()));
}

#[test]
fn types_are_predicted_from_the_factory_declaration() {
    let factory = factory();
    factory
        .register_bean_definition("tbf", BeanDefinition::new("TestBeanFactory").property("name", "made"))
        .unwrap();

    assert_eq!(factory.get_type("tbf").unwrap(), Some(TypeDesc::bean("TestBean")));
    assert_eq!(factory.get_type("&tbf").unwrap(), Some(TypeDesc::bean("TestBeanFactory")));
    assert!(factory.is_type_match("tbf", &TypeDesc::bean("ITestBean")).unwrap());
    assert_eq!(factory.get_bean_names_for_type(&TypeDesc::bean("TestBean")), vec!["tbf".to_string()]);
    assert_eq!(factory.get_singleton_count(), 0);
}

#[test]
fn products_can_be_wired_into_other_beans() {
    let factory = factory();
    factory
        .register_bean_definition("tbf", BeanDefinition::new("TestBeanFactory").property("name", "product"))
        .unwrap();
    factory
        .register_bean_definition("user", BeanDefinition::new("TestBean").property_ref("spouse", "tbf"))
        .unwrap();

    let user = factory.get_bean("user").unwrap();
    let spouse = spouse_of(&user).unwrap();
    assert_eq!(name_of(&spouse), "product");
    assert!(spouse.ptr_eq(&factory.get_bean("tbf").unwrap()));
}

#[test]
fn dereferencing_a_plain_bean_fails() {
    let factory = factory();
    factory.register_bean_definition("plain", BeanDefinition::new("TestBean")).unwrap();
    match factory.get_bean("&plain") {
        Err(BeansError::BeanIsNotAFactory { bean_name, actual }) => {
            assert_eq!(bean_name, "plain");
            assert_eq!(actual, "TestBean");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unready_factory_reports_a_circular_reference() {
    let factory = factory();
    factory.register_bean_definition("empty", BeanDefinition::new("TestBeanFactory")).unwrap();
    assert!(matches!(
        factory.get_bean("empty"),
        Err(BeansError::FactoryBeanCircularReference { bean_name }) if bean_name == "empty"
    ));
    assert!(factory.get_bean("&empty").is_ok());
}

#[test]
fn pre_instantiation_creates_singleton_products() {
    let factory = factory();
    factory
        .register_bean_definition("tbf", BeanDefinition::new("TestBeanFactory").property("name", "eager"))
        .unwrap();
    factory
        .register_bean_definition("ptbf", BeanDefinition::new("PrototypeTestBeanFactory").property("name", "lazy"))
        .unwrap();

    factory.pre_instantiate_singletons().unwrap();
    assert_eq!(factory.get_singleton_names(), vec!["tbf".to_string(), "ptbf".to_string()]);
    assert_eq!(factory.get_type("tbf").unwrap(), Some(TypeDesc::bean("TestBean")));

    factory.destroy_singletons();
    assert_eq!(factory.get_singleton_count(), 0);
}
