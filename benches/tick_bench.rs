use std::time::Duration;

use chaos_office::{Population, SimulationConfig, World};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

const STEPS: usize = 60;

fn stress_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.population = Population {
        grinders: 24,
        wanderers: 40,
        gossips: 30,
        managers: 6,
        interns: 30,
        chaos_agents: 20,
    };
    // Keep load shedding out of the measurement
    config.cull_agent_ceiling = usize::MAX;
    config
}

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(10));

    let populations = [("default", SimulationConfig::default()), ("stress", stress_config())];
    for (label, config) in populations {
        group.bench_function(format!("{label}_{STEPS}_ticks"), |b| {
            b.iter_batched(
                || {
                    World::builder()
                        .config(config.clone())
                        .seed(0xC0FFEE)
                        .build()
                        .expect("valid bench config")
                },
                |mut world| {
                    for _ in 0..STEPS {
                        world.update(1.0 / 60.0);
                    }
                    world.drain_events();
                    world
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_disturbances(c: &mut Criterion) {
    c.bench_function("alarm_then_pizza_60_ticks", |b| {
        b.iter_batched(
            || World::builder().seed(7).build().expect("default config"),
            |mut world| {
                world.fire_alarm();
                world.drop_pizza(chaos_office::Vec2::new(800.0, 450.0));
                for _ in 0..STEPS {
                    world.update(1.0 / 60.0);
                }
                world
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_ticks, bench_disturbances);
criterion_main!(benches);
