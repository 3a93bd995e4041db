use fiber_core::{element, Element, MemoryHost, NodeId, Scheduler};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION: usize = 32;
const ROW_SAMPLES: &[usize] = &[8, 16, 32, 64];

fn content(sections: usize, rows_per_section: usize, revision: usize) -> Element {
    element("main")
        .children((0..sections).map(|section| {
            element("section")
                .prop("id", format!("section-{section}"))
                .child(element("h2").text(format!("Section {section}")))
                .children((0..rows_per_section).map(|row| {
                    element("div")
                        .prop("class", if (row + revision) % 2 == 0 { "even" } else { "odd" })
                        .child(element("span").text(format!("Item {section}-{row}")))
                        .child(element("span").text(revision as i64))
                }))
        }))
        .build()
}

fn fiber_count(sections: usize, rows_per_section: usize) -> usize {
    1 + sections * (3 + rows_per_section * 5)
}

struct Fixture {
    scheduler: Scheduler<MemoryHost>,
    container: NodeId,
    sections: usize,
    rows_per_section: usize,
    revision: usize,
}

impl Fixture {
    fn new(sections: usize, rows_per_section: usize) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        Self {
            scheduler: Scheduler::new(host),
            container,
            sections,
            rows_per_section,
            revision: 0,
        }
    }

    fn render(&mut self) {
        let root = content(self.sections, self.rows_per_section, self.revision);
        self.scheduler.render(root, self.container);
        self.scheduler.flush().expect("flush");
        self.scheduler.host_mut().take_mutations();
    }
}

fn bench_mount(c: &mut Criterion) {
    c.bench_function("reconcile_mount", |b| {
        b.iter(|| {
            let mut fixture = Fixture::new(SECTION_COUNT, ROWS_PER_SECTION);
            fixture.render();
            black_box(fixture.scheduler.fibers().len());
        });
    });
}

fn bench_noop(c: &mut Criterion) {
    let mut fixture = Fixture::new(SECTION_COUNT, ROWS_PER_SECTION);
    // Warm up so steady-state reconciliation is measured.
    fixture.render();

    c.bench_function("reconcile_noop", |b| {
        b.iter(|| fixture.render());
    });
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_update");
    for &rows_per_section in ROW_SAMPLES {
        let fibers = fiber_count(SECTION_COUNT, rows_per_section);
        group.bench_with_input(
            BenchmarkId::new("fibers", fibers),
            &rows_per_section,
            |b, &rows_per_section| {
                let mut fixture = Fixture::new(SECTION_COUNT, rows_per_section);
                fixture.render();

                b.iter(|| {
                    fixture.revision += 1;
                    fixture.render();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(reconcile, bench_mount, bench_noop, bench_update);
criterion_main!(reconcile);
