mod common;

use std::sync::Arc;

use common::*;
use ferrous_beans::{
    BeanDefinition, BeanFactory, BeanPostProcessor, BeanValue, BeansError, BoxError, ClassBuilder, Instance, TypeDesc,
    Value,
};
use parking_lot::Mutex;

fn lifecycle_factory() -> (BeanFactory, EventLog) {
    let log = event_log();
    let factory = factory();
    factory.register_class(lifecycle_class(&log));
    (factory, log)
}

fn lifecycle_bean(label: &str) -> BeanDefinition {
    BeanDefinition::new("LifecycleBean")
        .property("label", label)
        .init_method("customInit")
        .destroy_method("customDestroy")
}

#[test]
fn callbacks_run_in_order() {
    let (factory, log) = lifecycle_factory();
    factory.register_bean_definition("bean", lifecycle_bean("x")).unwrap();

    factory.get_bean("bean").unwrap();
    assert_eq!(events(&log), vec!["name:bean:x", "init:x", "customInit:x"]);

    factory.destroy_singletons();
    assert_eq!(
        events(&log)[3..].to_vec(),
        vec!["destroy:x".to_string(), "customDestroy:x".to_string()]
    );
    assert_eq!(factory.get_singleton_count(), 0);
}

#[test]
fn singletons_are_destroyed_in_reverse_creation_order() {
    let (factory, log) = lifecycle_factory();
    for label in ["first", "second", "third"] {
        factory
            .register_bean_definition(label, BeanDefinition::new("LifecycleBean").property("label", label))
            .unwrap();
    }
    factory.pre_instantiate_singletons().unwrap();
    log.lock().clear();

    factory.destroy_singletons();
    assert_eq!(events(&log), vec!["destroy:third", "destroy:second", "destroy:first"]);
}

#[test]
fn dependents_are_destroyed_first() {
    let (factory, log) = lifecycle_factory();
    factory
        .register_bean_definition("database", BeanDefinition::new("LifecycleBean").property("label", "database"))
        .unwrap();
    factory
        .register_bean_definition(
            "repository",
            BeanDefinition::new("LifecycleBean").property("label", "repository").depends_on(["database"]),
        )
        .unwrap();
    factory
        .register_bean_definition("unrelated", BeanDefinition::new("LifecycleBean").property("label", "unrelated"))
        .unwrap();
    factory.pre_instantiate_singletons().unwrap();
    log.lock().clear();

    factory.destroy_singleton("database");
    assert_eq!(events(&log), vec!["destroy:repository", "destroy:database"]);
    assert_eq!(factory.get_singleton_names(), vec!["unrelated".to_string()]);
}

#[test]
fn inner_beans_are_destroyed_with_the_factory() {
    let (factory, log) = lifecycle_factory();
    factory
        .register_bean_definition(
            "outer",
            BeanDefinition::new("LifecycleBean")
                .property("label", "outer")
                .property("peer", BeanValue::inner(lifecycle_bean("inner"))),
        )
        .unwrap();
    let outer = factory.get_bean("outer").unwrap();
    let peer = outer.with(|b: &LifecycleBean| b.peer.clone()).flatten().unwrap();
    assert_eq!(peer.with(|b: &LifecycleBean| b.label.clone()).unwrap(), "inner");
    log.lock().clear();

    factory.destroy_singletons();
    assert_eq!(
        events(&log),
        vec!["destroy:outer", "destroy:inner", "customDestroy:inner"]
    );
}

#[test]
fn lazy_and_prototype_beans_are_not_pre_instantiated() {
    let (factory, log) = lifecycle_factory();
    factory
        .register_bean_definition("eager", BeanDefinition::new("LifecycleBean").property("label", "eager"))
        .unwrap();
    factory
        .register_bean_definition("lazy", BeanDefinition::new("LifecycleBean").property("label", "lazy").lazy_init(true))
        .unwrap();
    factory
        .register_bean_definition("proto", BeanDefinition::new("LifecycleBean").property("label", "proto").prototype())
        .unwrap();

    factory.pre_instantiate_singletons().unwrap();
    assert_eq!(factory.get_singleton_names(), vec!["eager".to_string()]);
    assert_eq!(events(&log), vec!["name:eager:eager", "init:eager"]);
}

#[test]
fn failed_pre_instantiation_destroys_created_singletons() {
    let (factory, log) = lifecycle_factory();
    factory
        .register_bean_definition("good", BeanDefinition::new("LifecycleBean").property("label", "good"))
        .unwrap();
    factory
        .register_bean_definition("broken", BeanDefinition::new("LifecycleBean").property("label", "broken").init_method("missing"))
        .unwrap();

    let err = factory.pre_instantiate_singletons().unwrap_err();
    assert_eq!(err.bean_name(), Some("broken"));
    assert_eq!(factory.get_singleton_count(), 0);
    assert!(events(&log).contains(&"destroy:good".to_string()));
}

struct Closeable {
    closed_with: Option<bool>,
}

#[test]
fn destroy_method_may_take_a_flag() {
    let factory = factory();
    let closed = Arc::new(Mutex::new(None));
    let record = closed.clone();
    factory.register_class(
        ClassBuilder::<Closeable>::new("Closeable")
            .constructor(vec![], |_| Ok(Closeable { closed_with: None }))
            .method("close", vec![TypeDesc::Bool], move |c: &mut Closeable, args| {
                c.closed_with = Some(args.get(0)?);
                *record.lock() = c.closed_with;
                Ok(Value::Null)
            })
            .build(),
    );
    factory
        .register_bean_definition("conn", BeanDefinition::new("Closeable").destroy_method("close"))
        .unwrap();
    factory.get_bean("conn").unwrap();
    factory.destroy_singletons();
    assert_eq!(*closed.lock(), Some(true));
}

#[derive(Default)]
struct Recorder {
    before: Mutex<Vec<String>>,
    after: Mutex<Vec<String>>,
    destroyed: Mutex<Vec<String>>,
}

impl BeanPostProcessor for Recorder {
    fn post_process_before_initialization(&self, bean: Instance, name: &str) -> Result<Option<Instance>, BoxError> {
        self.before.lock().push(name.to_string());
        bean.with_mut(|b: &mut TestBean| b.name = b.name.to_uppercase());
        Ok(Some(bean))
    }

    fn post_process_after_initialization(&self, bean: Instance, name: &str) -> Result<Option<Instance>, BoxError> {
        self.after.lock().push(name.to_string());
        Ok(Some(bean))
    }

    fn post_process_before_destruction(&self, _bean: &Instance, name: &str) -> Result<(), BoxError> {
        self.destroyed.lock().push(name.to_string());
        Ok(())
    }
}

#[test]
fn post_processors_see_every_created_bean() {
    let factory = factory();
    let recorder = Arc::new(Recorder::default());
    factory.add_bean_post_processor(recorder.clone());
    assert_eq!(factory.bean_post_processor_count(), 1);
    factory
        .register_bean_definition("loud", BeanDefinition::new("TestBean").property("name", "quiet"))
        .unwrap();
    factory.register_bean_definition("a", BeanDefinition::new("TypeA")).unwrap();

    assert_eq!(name_of(&factory.get_bean("loud").unwrap()), "QUIET");
    factory.get_bean("a").unwrap();
    assert_eq!(*recorder.before.lock(), vec!["loud", "a"]);
    assert_eq!(*recorder.after.lock(), vec!["loud", "a"]);

    factory.destroy_singletons();
    assert_eq!(*recorder.destroyed.lock(), vec!["a", "loud"]);
}

struct Replacer {
    replacement: Instance,
}

impl BeanPostProcessor for Replacer {
    fn post_process_after_initialization(&self, _bean: Instance, name: &str) -> Result<Option<Instance>, BoxError> {
        if name == "replaced" {
            Ok(Some(self.replacement.clone()))
        } else {
            Ok(None)
        }
    }
}

#[test]
fn post_processor_can_replace_or_reject_a_bean() {
    let factory = factory();
    let class = factory.classes().get("TestBean").unwrap();
    let replacement = Instance::new(
        &class,
        TestBean {
            name: "proxy".into(),
            ..TestBean::default()
        },
    );
    factory.add_bean_post_processor(Arc::new(Replacer {
        replacement: replacement.clone(),
    }));
    factory.register_bean_definition("replaced", BeanDefinition::new("TestBean")).unwrap();
    factory.register_bean_definition("rejected", BeanDefinition::new("TestBean")).unwrap();

    assert!(factory.get_bean("replaced").unwrap().ptr_eq(&replacement));
    match factory.get_bean("rejected") {
        Err(BeansError::BeanCreation { message, .. }) => assert_eq!(
            message,
            "BeanPostProcessor returned null for bean 'rejected' in post_process_after_initialization"
        ),
        other => panic!("unexpected {other:?}"),
    }
}

#[derive(Default)]
struct Flaky {
    initialized: bool,
}

#[test]
fn panicking_init_does_not_leave_a_half_built_singleton() {
    let factory = factory();
    let first_call = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let fail_once = first_call.clone();
    factory.register_class(
        ClassBuilder::<Flaky>::new("Flaky")
            .default_constructor()
            .initializing(move |f: &mut Flaky| {
                if fail_once.swap(false, std::sync::atomic::Ordering::SeqCst) {
                    panic!("first initialization fails");
                }
                f.initialized = true;
            })
            .build(),
    );
    factory.register_bean_definition("flaky", BeanDefinition::new("Flaky")).unwrap();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| factory.get_bean("flaky")));
    assert!(outcome.is_err());
    assert!(!factory.is_currently_in_creation("flaky"));
    assert_eq!(factory.get_singleton_count(), 0);
    assert_eq!(factory.creation_depth(), 0);

    let bean = factory.get_bean("flaky").unwrap();
    assert_eq!(bean.with(|f: &Flaky| f.initialized), Some(true));
    assert!(factory.get_bean("flaky").unwrap().ptr_eq(&bean));
}
