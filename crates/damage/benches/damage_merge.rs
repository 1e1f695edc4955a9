use criterion::{black_box, criterion_group, criterion_main, Criterion};
use semadraw_damage::{DamageTracker, Rect};

fn add_many_regions(tracker: &mut DamageTracker, count: u32) {
    for i in 0..count {
        let x = (i % 64) as i32 * 4;
        let y = (i / 64) as i32 * 4;
        tracker.add_region(1, Rect::new(x, y, 4, 4), 1);
    }
}

fn bench_damage_merge(c: &mut Criterion) {
    c.bench_function("damage_merge_200_adjacent_regions", |b| {
        b.iter(|| {
            let mut tracker = DamageTracker::new();
            add_many_regions(&mut tracker, black_box(200));
            black_box(tracker.has_damage(1));
        });
    });
}

criterion_group!(benches, bench_damage_merge);
criterion_main!(benches);
