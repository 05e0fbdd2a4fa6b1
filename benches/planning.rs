//! Benchmarks for release planning.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use agkbuild::config::{MediaFilter, ReleaseConfig};
use agkbuild::plan::{resolve_release, scan_media};
use agkbuild::project::substitute_tags;
use agkbuild::types::PlatformTarget;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A project with `files` media files spread over a few folders.
fn project(files: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("MyGame.agk"),
        "[apk_settings]\napp_type=0\napp_name=My Game\npackage_name=com.example.mygame\n",
    );
    write(
        &dir.path().join("main.agc"),
        "#constant VERSION \"1.0\"\n#include \"demo-on.agc\" // @@demo\n",
    );
    write(&dir.path().join("demo-off.agc"), "");
    for i in 0..files {
        let folder = ["sprites", "sounds", "music/loops", "fonts"][i % 4];
        write(
            &dir.path().join("media").join(folder).join(format!("file{}.dat", i)),
            "data",
        );
    }
    dir
}

fn release() -> ReleaseConfig {
    ReleaseConfig {
        project: Some("MyGame.agk".into()),
        platforms: vec![
            PlatformTarget::WindowsX64,
            PlatformTarget::LinuxX64,
            PlatformTarget::Html5,
        ],
        include_tags: BTreeMap::from([("demo".to_string(), "demo-off.agc".to_string())]),
        archive: true,
        ..Default::default()
    }
}

// -- Media scanning --

fn bench_media(c: &mut Criterion) {
    let mut group = c.benchmark_group("media");

    let small = project(20);
    let large = project(2000);
    let filter = MediaFilter {
        exclude: vec!["music/*".to_string(), "*.wav".to_string()],
        ..Default::default()
    };

    group.bench_function("scan_small", |b| {
        b.iter(|| scan_media(black_box(&small.path().join("media")), &MediaFilter::default()).unwrap())
    });

    group.bench_function("scan_large", |b| {
        b.iter(|| scan_media(black_box(&large.path().join("media")), &MediaFilter::default()).unwrap())
    });

    group.bench_function("scan_large_filtered", |b| {
        b.iter(|| scan_media(black_box(&large.path().join("media")), &filter).unwrap())
    });

    group.finish();
}

// -- Resolution --

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    let dir = project(200);
    let release = release();

    group.bench_function("resolve_release", |b| {
        b.iter(|| resolve_release(black_box(&release), dir.path()).unwrap())
    });

    let source: String = (0..500)
        .map(|i| {
            if i % 50 == 0 {
                "#include \"demo-on.agc\" // @@demo\n".to_string()
            } else {
                format!("x{} = {}\n", i, i)
            }
        })
        .collect();
    group.bench_function("substitute_tags", |b| {
        b.iter(|| substitute_tags(black_box(&source), &release.include_tags).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_media, bench_resolution);
criterion_main!(benches);
