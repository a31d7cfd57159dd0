use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_webpmark")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "webpmark.exe"
            } else {
                "webpmark"
            });
            p
        })
}

#[test]
fn cli_layer_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("nested").join("layer.png");

    let status = std::process::Command::new(exe())
        .args([
            "layer",
            "--width",
            "320",
            "--height",
            "180",
            "--text",
            "Hello",
            "--color",
            "#ff0000",
            "--position",
            "top-left",
            "--out",
        ])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (320, 180));
    assert!(img.pixels().any(|p| p[3] > 0));
    assert!(
        img.pixels()
            .filter(|p| p[3] > 0)
            .all(|p| p[0] == 255 && p[1] == 0 && p[2] == 0)
    );
}

#[test]
fn cli_layer_reads_preset() {
    let dir = tempfile::tempdir().unwrap();
    let preset = dir.path().join("preset.json");
    std::fs::write(&preset, r#"{ "watermark": { "text": "" } }"#).unwrap();
    let out_path = dir.path().join("empty.png");

    let status = std::process::Command::new(exe())
        .args(["layer", "--width", "16", "--height", "8", "--preset"])
        .arg(&preset)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert!(img.pixels().all(|p| p[3] == 0));
}

#[test]
fn cli_layer_rejects_out_of_range_opacity() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("layer.png");

    let status = std::process::Command::new(exe())
        .args(["layer", "--width", "16", "--height", "8", "--opacity", "5", "--out"])
        .arg(&out_path)
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!out_path.exists());
}
