//! Benchmarks for the static solver: first solve versus cached factorization

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fea_static::prelude::*;

fn create_multi_story_frame(stories: usize, bays: usize, cases: usize) -> Model {
    let mut model = Model::new();

    let column = Section::rectangular(0.4, 0.4);
    let beam = Section::rectangular(0.3, 0.6);
    let steel = Material::steel();

    let story_height = 3.5;
    let bay_width = 6.0;

    let mut grid = Vec::new();
    for story in 0..=stories {
        let mut row = Vec::new();
        for bay in 0..=bays {
            let mut node = Node::new(
                &format!("N{}_{}", story, bay),
                bay as f64 * bay_width,
                story as f64 * story_height,
                0.0,
            );
            if story == 0 {
                node = node.with_constraints(Constraints::fixed());
            }
            row.push(model.add_node(node).unwrap());
        }
        grid.push(row);
    }

    for story in 0..stories {
        for bay in 0..=bays {
            let label = format!("Col{}_{}", story, bay);
            model
                .add_element(FrameElement2Node::new(
                    &label,
                    grid[story][bay],
                    grid[story + 1][bay],
                    steel,
                    column,
                ))
                .unwrap();
        }
    }

    for story in 1..=stories {
        for bay in 0..bays {
            let label = format!("Beam{}_{}", story, bay);
            model
                .add_element(FrameElement2Node::new(
                    &label,
                    grid[story][bay],
                    grid[story][bay + 1],
                    steel,
                    beam,
                ))
                .unwrap();
        }
    }

    for case in 0..cases {
        let name = format!("Lateral {}", case);
        for story in 1..=stories {
            let force = 1000.0 * (case + 1) as f64 * story as f64;
            model
                .add_nodal_load(grid[story][0], NodalLoad::fx(force, name.as_str()))
                .unwrap();
        }
    }

    model
}

fn benchmark_first_solve(c: &mut Criterion) {
    c.bench_function("frame_10story_5bay_first_solve", |b| {
        b.iter(|| {
            let mut model = create_multi_story_frame(10, 5, 1);
            model.solve(&LoadCase::from("Lateral 0")).unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_cached_solves(c: &mut Criterion) {
    c.bench_function("frame_10story_5bay_8_cases_cached", |b| {
        b.iter(|| {
            let mut model = create_multi_story_frame(10, 5, 8);
            model.solve_all().unwrap();
            assert_eq!(model.results().solver_cache().len(), 1);
            black_box(&model);
        })
    });
}

fn benchmark_parallel_cases(c: &mut Criterion) {
    c.bench_function("frame_10story_5bay_8_cases_parallel", |b| {
        b.iter(|| {
            let mut model = create_multi_story_frame(10, 5, 8);
            model.solve_parallel().unwrap();
            black_box(&model);
        })
    });
}

fn benchmark_pcg(c: &mut Criterion) {
    c.bench_function("frame_5story_3bay_pcg", |b| {
        b.iter(|| {
            let mut model = create_multi_story_frame(5, 3, 1);
            model.set_options(AnalysisOptions::conjugate_gradient().with_tolerance(1e-8));
            model.solve(&LoadCase::from("Lateral 0")).unwrap();
            black_box(&model);
        })
    });
}

criterion_group!(
    benches,
    benchmark_first_solve,
    benchmark_cached_solves,
    benchmark_parallel_cases,
    benchmark_pcg,
);

criterion_main!(benches);
