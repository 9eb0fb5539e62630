use criterion::{Criterion, criterion_group, criterion_main};
use gentoo_updater::services::OutputClassifier;
use std::hint::black_box;

/// Pretend output roughly the size of a large world upgrade.
fn large_pretend_output(packages: usize) -> String {
    let mut output = String::from("These are the packages that would be merged, in order:\n\n");
    for i in 0..packages {
        output.push_str(&format!(
            "[ebuild     U  ] dev-libs/package{i}-1.{i}.0::gentoo [1.{i}.-1] USE=\"ssl -test\" 1,024 KiB\n"
        ));
    }
    output.push_str(&format!("\nTotal: {packages} packages ({packages} upgrades), Size of downloads: 1,024,000 KiB\n"));
    output
}

fn bench_classifier(c: &mut Criterion) {
    let classifier = OutputClassifier::new();
    let output = large_pretend_output(800);
    let critical = vec![
        "sys-devel/gcc".to_string(),
        "sys-libs/glibc".to_string(),
        "dev-lang/python".to_string(),
    ];

    c.bench_function("extract_packages_800", |b| {
        b.iter(|| classifier.extract_packages(black_box(&output)))
    });
    c.bench_function("needs_autounmask_800", |b| {
        b.iter(|| classifier.needs_autounmask(black_box(&output)))
    });
    c.bench_function("critical_matches_800", |b| {
        b.iter(|| classifier.critical_matches(black_box(&output), black_box(&critical)))
    });
}

criterion_group!(benches, bench_classifier);
criterion_main!(benches);
