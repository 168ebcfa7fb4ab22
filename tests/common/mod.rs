#![allow(dead_code)]

use std::sync::Arc;

use ferrous_beans::{Args, BeanFactory, Class, ClassBuilder, Instance, TypeDesc, Value, ValueMap, OBJECT};
use parking_lot::Mutex;

/// Shared record of lifecycle callbacks, in call order.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}

#[derive(Clone, Default)]
pub struct TestBean {
    pub name: String,
    pub age: i64,
    pub spouse: Option<Instance>,
    pub friends: Vec<String>,
    pub settings: ValueMap,
    pub bean_name: Option<String>,
}

pub fn test_bean_class() -> Arc<Class> {
    ClassBuilder::<TestBean>::new("TestBean")
        .implements("ITestBean")
        .default_constructor()
        .constructor(vec![TypeDesc::Str, TypeDesc::Int], |args: Args| {
            Ok(TestBean {
                name: args.get(0)?,
                age: args.get(1)?,
                ..TestBean::default()
            })
        })
        .property("name", |b: &TestBean| b.name.clone(), |b: &mut TestBean, v: String| b.name = v)
        .property("age", |b: &TestBean| b.age, |b: &mut TestBean, v: i64| b.age = v)
        .property_as(
            "spouse",
            TypeDesc::bean("ITestBean"),
            |b: &TestBean| b.spouse.clone(),
            |b: &mut TestBean, v: Option<Instance>| b.spouse = v,
        )
        .property("friends", |b: &TestBean| b.friends.clone(), |b: &mut TestBean, v: Vec<String>| b.friends = v)
        .property("settings", |b: &TestBean| b.settings.clone(), |b: &mut TestBean, v: ValueMap| b.settings = v)
        .bean_name_aware(|b: &mut TestBean, name: &str| b.bean_name = Some(name.to_string()))
        .build()
}

pub fn name_of(bean: &Instance) -> String {
    bean.with(|b: &TestBean| b.name.clone()).unwrap_or_default()
}

pub fn spouse_of(bean: &Instance) -> Option<Instance> {
    bean.with(|b: &TestBean| b.spouse.clone()).flatten()
}

#[derive(Default)]
pub struct TypeA;

#[derive(Default)]
pub struct SubA;

pub fn type_a_classes() -> (Arc<Class>, Arc<Class>) {
    let type_a = ClassBuilder::<TypeA>::new("TypeA").default_constructor().build();
    let sub_a = ClassBuilder::<SubA>::new("SubA").extends(&type_a).default_constructor().build();
    (type_a, sub_a)
}

/// Records which of its overloaded constructors was used.
pub struct ArgHolder {
    pub chosen: &'static str,
    pub arg: Option<Instance>,
}

pub fn arg_holder_class() -> Arc<Class> {
    ClassBuilder::<ArgHolder>::new("ArgHolder")
        .constructor(vec![TypeDesc::bean(OBJECT)], |args: Args| {
            Ok(ArgHolder {
                chosen: "Object",
                arg: args.get(0)?,
            })
        })
        .constructor(vec![TypeDesc::bean("TypeA")], |args: Args| {
            Ok(ArgHolder {
                chosen: "TypeA",
                arg: args.get(0)?,
            })
        })
        .build()
}

/// A bean that logs every lifecycle step it goes through.
#[derive(Default)]
pub struct LifecycleBean {
    pub label: String,
    pub peer: Option<Instance>,
}

pub fn lifecycle_class(log: &EventLog) -> Arc<Class> {
    let (on_name, on_init, on_custom_init, on_destroy, on_custom_destroy) =
        (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
    ClassBuilder::<LifecycleBean>::new("LifecycleBean")
        .default_constructor()
        .property("label", |b: &LifecycleBean| b.label.clone(), |b: &mut LifecycleBean, v: String| b.label = v)
        .property_as(
            "peer",
            TypeDesc::bean(OBJECT),
            |b: &LifecycleBean| b.peer.clone(),
            |b: &mut LifecycleBean, v: Option<Instance>| b.peer = v,
        )
        .bean_name_aware(move |b: &mut LifecycleBean, name: &str| {
            on_name.lock().push(format!("name:{}:{}", name, b.label));
        })
        .initializing(move |b: &mut LifecycleBean| on_init.lock().push(format!("init:{}", b.label)))
        .method0("customInit", move |b: &mut LifecycleBean| {
            on_custom_init.lock().push(format!("customInit:{}", b.label))
        })
        .disposable(move |b: &mut LifecycleBean| on_destroy.lock().push(format!("destroy:{}", b.label)))
        .method0("customDestroy", move |b: &mut LifecycleBean| {
            on_custom_destroy.lock().push(format!("customDestroy:{}", b.label))
        })
        .build()
}

/// Factory bean producing `TestBean`s named after its `name` property.
#[derive(Default)]
pub struct TestBeanFactory {
    pub name: String,
}

pub fn test_bean_factory_class(test_bean: &Arc<Class>, singleton: bool) -> Arc<Class> {
    let product_class = test_bean.clone();
    ClassBuilder::<TestBeanFactory>::new(if singleton { "TestBeanFactory" } else { "PrototypeTestBeanFactory" })
        .default_constructor()
        .property("name", |f: &TestBeanFactory| f.name.clone(), |f: &mut TestBeanFactory, v: String| f.name = v)
        .factory_bean(TypeDesc::bean("TestBean"), singleton, move |f: &TestBeanFactory| {
            if f.name.is_empty() {
                return Ok(Value::Null);
            }
            Ok(Value::Object(Instance::new(
                &product_class,
                TestBean {
                    name: f.name.clone(),
                    ..TestBean::default()
                },
            )))
        })
        .build()
}

/// Routes container logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A factory with all fixture classes registered.
pub fn factory() -> BeanFactory {
    init_tracing();
    let factory = BeanFactory::new();
    register_fixtures(&factory);
    factory
}

pub fn register_fixtures(factory: &BeanFactory) {
    let test_bean = factory.register_class(test_bean_class());
    let (type_a, sub_a) = type_a_classes();
    factory.register_class(type_a);
    factory.register_class(sub_a);
    factory.register_class(arg_holder_class());
    factory.register_class(test_bean_factory_class(&test_bean, true));
    factory.register_class(test_bean_factory_class(&test_bean, false));
}
