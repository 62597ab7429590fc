//! 查找表插值性能基准测试

use beam_pseudo::{LookupTable, PseudoAxisSpec, PseudoPositionerBuilder, Table, interp};
use beam_signal::{Positioner, SimMotor};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

fn bench_interp(c: &mut Criterion) {
    let xp: Vec<f64> = (0..1024).map(|i| i as f64).collect();
    let fp: Vec<f64> = xp.iter().map(|x| x * x).collect();

    c.bench_function("interp_1024", |b| {
        b.iter(|| interp(black_box(511.5), black_box(&xp), black_box(&fp)))
    });
}

fn bench_lookup_forward(c: &mut Criterion) {
    let rows: Vec<[f64; 2]> = (0..1024).map(|i| [i as f64 * 0.1, i as f64]).collect();
    let table = Table::from_rows(&rows).unwrap();
    let motor: Arc<dyn Positioner> = Arc::new(SimMotor::new("M", "mm"));
    let lut = PseudoPositionerBuilder::new("lut", LookupTable::new(table, ["mtr", "pseudo"]))
        .pseudo_axis(PseudoAxisSpec::new("pseudo"))
        .real_axis("mtr", motor)
        .build()
        .unwrap();
    let target = lut.make_position([512.25]).unwrap();

    c.bench_function("lookup_forward_1024", |b| {
        b.iter(|| lut.forward(black_box(&target)).unwrap())
    });
}

criterion_group!(benches, bench_interp, bench_lookup_forward);
criterion_main!(benches);
