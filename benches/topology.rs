//! Benchmark for status decoding and topology derivation
//!
//! Shape: one pool with 64 raidz2 groups of 8 disks (512 disks)

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use zpool_control::status::{JsonStatusParser, TextStatusParser};
use zpool_control::topology::{flatten, pool_redundancy};
use zpool_control::StatusParser;

const GROUPS: usize = 64;
const DISKS_PER_GROUP: usize = 8;

fn json_document() -> String {
    let groups: Vec<String> = (0..GROUPS)
        .map(|g| {
            let disks: Vec<String> = (0..DISKS_PER_GROUP)
                .map(|d| {
                    let name = format!("d{}-{}", g, d);
                    format!(
                        r#""{n}": {{"name": "{n}", "vdev_type": "disk", "path": "/dev/disk/by-id/{n}", "state": "ONLINE", "read_errors": "0", "write_errors": "0", "checksum_errors": "0"}}"#,
                        n = name
                    )
                })
                .collect();
            format!(
                r#""raidz2-{g}": {{"name": "raidz2-{g}", "vdev_type": "raidz", "nparity": "2", "state": "ONLINE", "vdevs": {{{disks}}}}}"#,
                g = g,
                disks = disks.join(",")
            )
        })
        .collect();

    format!(
        r#"{{"output_version": {{"command": "zpool status", "vers_major": 0, "vers_minor": 1}},
        "pools": {{"big": {{"name": "big", "state": "ONLINE", "pool_guid": "1",
        "vdevs": {{"big": {{"name": "big", "vdev_type": "root", "state": "ONLINE", "vdevs": {{{}}}}}}}}}}}}}"#,
        groups.join(",")
    )
}

fn text_document() -> String {
    let mut out = String::from("  pool: big\n state: ONLINE\nconfig:\n\n");
    out.push_str("\tNAME          STATE     READ WRITE CKSUM\n");
    out.push_str("\tbig           ONLINE       0     0     0\n");
    for g in 0..GROUPS {
        out.push_str(&format!("\t  raidz2-{}    ONLINE       0     0     0\n", g));
        for d in 0..DISKS_PER_GROUP {
            out.push_str(&format!("\t    d{}-{}     ONLINE       0     0     0\n", g, d));
        }
    }
    out.push_str("\nerrors: No known data errors\n");
    out
}

fn bench_json_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");
    group.throughput(Throughput::Elements((GROUPS * DISKS_PER_GROUP) as u64));

    let raw = json_document().into_bytes();
    let parser = JsonStatusParser;

    group.bench_function("json_parse_flatten_redundancy", |b| {
        b.iter(|| {
            let reports = parser.parse(black_box(&raw), 0).unwrap_or_default();
            for report in &reports {
                let groups = flatten(&report.vdevs);
                black_box(pool_redundancy(&groups));
            }
        });
    });

    group.finish();
}

fn bench_text_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");
    group.throughput(Throughput::Elements((GROUPS * DISKS_PER_GROUP) as u64));

    let raw = text_document().into_bytes();
    let parser = TextStatusParser;

    group.bench_function("text_parse_flatten_redundancy", |b| {
        b.iter(|| {
            let reports = parser.parse(black_box(&raw), 0).unwrap_or_default();
            for report in &reports {
                let groups = flatten(&report.vdevs);
                black_box(pool_redundancy(&groups));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_json_status, bench_text_status);
criterion_main!(benches);
