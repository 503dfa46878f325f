use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rtti_engine::{Instance, MethodDescriptor, Reflect, Registry, Variant};

#[derive(Clone, Default)]
struct Shape {
    width: i32,
    height: i32,
}

impl Reflect for Shape {}

fn shape_registry() -> Registry {
    let registry = Registry::new();
    let shape = registry.type_of::<Shape>().unwrap();
    registry
        .register_method(
            shape,
            MethodDescriptor::from_mut1::<Shape, i32, (), _>(&registry, "resize", |s, w| {
                s.width = w;
            })
            .unwrap(),
        )
        .unwrap();
    registry
        .register_method(
            shape,
            MethodDescriptor::from_mut2::<Shape, i32, i32, (), _>(&registry, "resize", |s, w, h| {
                s.width = w;
                s.height = h;
            })
            .unwrap(),
        )
        .unwrap();
    registry
}

fn bench_type_of(c: &mut Criterion) {
    let registry = shape_registry();

    c.bench_function("type_of_cached", |b| {
        b.iter(|| registry.type_of::<Shape>().unwrap());
    });
}

fn bench_overload_lookup(c: &mut Criterion) {
    let registry = shape_registry();
    let shape = registry.type_of::<Shape>().unwrap();
    let int = registry.type_of::<i32>().unwrap();
    let mut group = c.benchmark_group("overload_lookup");

    for args in [vec![int], vec![int, int]] {
        group.bench_with_input(BenchmarkId::new("resize", args.len()), &args, |b, args| {
            b.iter(|| registry.find_method_with_args("resize", black_box(args), shape));
        });
    }

    group.finish();
}

fn bench_invoke(c: &mut Criterion) {
    let registry = shape_registry();
    let shape = registry.type_of::<Shape>().unwrap();
    let int = registry.type_of::<i32>().unwrap();
    let args = [Variant::new(int, 3i32), Variant::new(int, 4i32)];

    c.bench_function("invoke_resize", |b| {
        let mut object = Shape::default();
        b.iter(|| {
            registry
                .invoke(shape, "resize", Instance::Mut(&mut object), black_box(&args))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_type_of, bench_overload_lookup, bench_invoke);
criterion_main!(benches);
