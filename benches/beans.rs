use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_beans::{
    Args, AutowireMode, BeanDefinition, BeanFactory, BeanWrapper, Class, ClassBuilder, Instance, TypeDesc, Value,
};

#[derive(Clone, Default)]
struct Person {
    name: String,
    age: i64,
    spouse: Option<Instance>,
    friends: Vec<String>,
}

fn person_class() -> Arc<Class> {
    ClassBuilder::<Person>::new("Person")
        .implements("IPerson")
        .default_constructor()
        .constructor(vec![TypeDesc::Str, TypeDesc::Int], |args: Args| {
            Ok(Person {
                name: args.get(0)?,
                age: args.get(1)?,
                ..Person::default()
            })
        })
        .property("name", |p: &Person| p.name.clone(), |p: &mut Person, v: String| p.name = v)
        .property("age", |p: &Person| p.age, |p: &mut Person, v: i64| p.age = v)
        .property_as(
            "spouse",
            TypeDesc::bean("IPerson"),
            |p: &Person| p.spouse.clone(),
            |p: &mut Person, v: Option<Instance>| p.spouse = v,
        )
        .property("friends", |p: &Person| p.friends.clone(), |p: &mut Person, v: Vec<String>| p.friends = v)
        .build()
}

#[derive(Default)]
struct Consumer {
    partner: Option<Instance>,
}

fn consumer_class() -> Arc<Class> {
    ClassBuilder::<Consumer>::new("Consumer")
        .default_constructor()
        .property_as(
            "partner",
            TypeDesc::bean("IPerson"),
            |c: &Consumer| c.partner.clone(),
            |c: &mut Consumer, v: Option<Instance>| c.partner = v,
        )
        .build()
}

fn bench_factory() -> BeanFactory {
    let factory = BeanFactory::new();
    factory.register_class(person_class());
    factory.register_class(consumer_class());
    factory
}

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let factory = bench_factory();
    factory
        .register_bean_definition("rod", BeanDefinition::new("Person").property("name", "Rod"))
        .unwrap();
    let _ = factory.get_bean("rod").unwrap();

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let bean = factory.get_bean(black_box("rod")).unwrap();
            black_box(bean);
        })
    });

    factory
        .register_bean_definition("kerry", BeanDefinition::new("Person"))
        .unwrap();
    factory.register_alias("kerry", "k").unwrap();
    let _ = factory.get_bean("k").unwrap();

    c.bench_function("singleton_hit_via_alias", |b| {
        b.iter(|| {
            let bean = factory.get_bean(black_box("k")).unwrap();
            black_box(bean);
        })
    });
}

fn bench_prototype_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("prototype_creation");

    let factory = bench_factory();
    factory
        .register_bean_definition("plain", BeanDefinition::new("Person").prototype())
        .unwrap();
    factory
        .register_bean_definition(
            "populated",
            BeanDefinition::new("Person")
                .prototype()
                .property("name", "Rod")
                .property("age", "31")
                .property("friends", "a,b,c"),
        )
        .unwrap();
    factory
        .register_bean_definition(
            "constructed",
            BeanDefinition::new("Person").prototype().constructor_arg("Rod").constructor_arg("31"),
        )
        .unwrap();

    for name in ["plain", "populated", "constructed"] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let bean = factory.get_bean(name).unwrap();
                black_box(bean);
            })
        });
    }

    group.finish();
}

fn bench_nested_property_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_path");

    let class = person_class();
    let inner = Instance::new(
        &class,
        Person {
            name: "Kerry".into(),
            friends: vec!["a".into(), "b".into()],
            ..Person::default()
        },
    );
    let wrapper = BeanWrapper::new(Instance::new(
        &class,
        Person {
            spouse: Some(inner),
            ..Person::default()
        },
    ));

    group.bench_function("get_nested", |b| {
        b.iter(|| black_box(wrapper.get_property_value(black_box("spouse.name")).unwrap()))
    });
    group.bench_function("get_indexed", |b| {
        b.iter(|| black_box(wrapper.get_property_value(black_box("spouse.friends[1]")).unwrap()))
    });
    group.bench_function("set_converted", |b| {
        b.iter(|| {
            wrapper
                .set_property_value(black_box("spouse.age"), Value::from("42"))
                .unwrap()
        })
    });

    group.finish();
}

fn bench_circular_resolution(c: &mut Criterion) {
    c.bench_function("circular_pair_cold", |b| {
        b.iter(|| {
            let factory = bench_factory();
            factory
                .register_bean_definition("tony", BeanDefinition::new("Person").property_ref("spouse", "pepper"))
                .unwrap();
            factory
                .register_bean_definition("pepper", BeanDefinition::new("Person").property_ref("spouse", "tony"))
                .unwrap();
            black_box(factory.get_bean("tony").unwrap());
        })
    });
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    let factory = bench_factory();
    factory.register_bean_definition("shared", BeanDefinition::new("Person")).unwrap();
    // Prime the singleton
    let _ = factory.get_bean("shared").unwrap();

    for &thread_count in &[1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("singleton_threads", thread_count),
            &thread_count,
            |b, &threads| {
                b.iter_custom(|iters| {
                    let start = std::time::Instant::now();
                    crossbeam_utils::thread::scope(|s| {
                        for _ in 0..threads {
                            let factory = &factory;
                            s.spawn(move |_| {
                                for _ in 0..iters / threads as u64 {
                                    black_box(factory.get_bean("shared").unwrap());
                                }
                            });
                        }
                    })
                    .unwrap();
                    start.elapsed()
                })
            },
        );
    }

    group.finish();
}

// ===== Macro Benchmarks =====

fn bench_autowire_by_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("autowire_by_type");

    for &bean_count in &[10, 100, 1000] {
        let factory = bench_factory();
        factory.register_bean_definition("target", BeanDefinition::new("Person")).unwrap();
        // Filler beans that type matching has to skip
        for i in 0..bean_count {
            factory
                .register_bean_definition(&format!("consumer{}", i), BeanDefinition::new("Consumer").lazy_init(true))
                .unwrap();
        }
        factory
            .register_bean_definition(
                "wired",
                BeanDefinition::new("Consumer").prototype().autowire(AutowireMode::ByType),
            )
            .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(bean_count), &bean_count, |b, _| {
            b.iter(|| black_box(factory.get_bean("wired").unwrap()))
        });
    }

    group.finish();
}

fn bench_pre_instantiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("pre_instantiation");
    group.sample_size(20);

    for &bean_count in &[10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(bean_count), &bean_count, |b, &count| {
            b.iter(|| {
                let factory = bench_factory();
                for i in 0..count {
                    let mut definition = BeanDefinition::new("Person").property("age", i as i64);
                    if i > 0 {
                        definition = definition.property_ref("spouse", format!("p{}", i - 1));
                    }
                    factory.register_bean_definition(&format!("p{}", i), definition).unwrap();
                }
                factory.pre_instantiate_singletons().unwrap();
                factory.destroy_singletons();
            })
        });
    }

    group.finish();
}

criterion_group!(
    micro_benches,
    bench_singleton_hit,
    bench_prototype_creation,
    bench_nested_property_path,
    bench_circular_resolution,
    bench_contention
);

criterion_group!(macro_benches, bench_autowire_by_type, bench_pre_instantiation);

criterion_main!(micro_benches, macro_benches);
