use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Output};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

fn kirinuki(store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kirinuki"))
        .arg("--store")
        .arg(store)
        .args(args)
        .env_remove("KIRINUKI_STORE")
        .env_remove("RUST_LOG")
        .output()
        .expect("run kirinuki")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "kirinuki failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_png(path: &Path, width: u32, height: u32) {
    let buf = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(buf)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    std::fs::write(path, out.into_inner()).unwrap();
}

#[test]
fn solve_a_four_piece_puzzle() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");
    let image = dir.path().join("source.png");
    write_png(&image, 120, 120);

    let configured = stdout(&kirinuki(
        &store,
        &[
            "configure",
            "--difficulty",
            "easy",
            "--size",
            "4",
            "--image",
            image.to_str().unwrap(),
        ],
    ));
    assert!(configured.contains("sliced image into 4 pieces"));
    assert!(configured.contains("play?difficulty=easy&size=4"));

    let status = stdout(&kirinuki(&store, &["status", "--seed", "1"]));
    assert!(status.contains("solved: false"));

    for idx in 0..3 {
        let out = stdout(&kirinuki(
            &store,
            &["place", "--tile", &idx.to_string(), "--cell", &idx.to_string()],
        ));
        assert!(!out.contains("puzzle solved!"));
    }
    let last = stdout(&kirinuki(&store, &["place", "--tile", "3", "--cell", "3"]));
    assert!(last.contains("solved: true"));
    assert!(last.contains("puzzle solved!"));

    let again = stdout(&kirinuki(&store, &["swap", "--from", "0", "--to", "1"]));
    assert!(again.contains("solved: false"));

    let exported = dir.path().join("tiles");
    let out = stdout(&kirinuki(&store, &["export", "--dir", exported.to_str().unwrap()]));
    assert!(out.contains("wrote 4 tiles"));
    assert_eq!(std::fs::read_dir(&exported).unwrap().count(), 4);
}

#[test]
fn placeholders_and_settings_without_image() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    let configured = stdout(&kirinuki(
        &store,
        &["configure", "--difficulty", "easy", "--size", "6"],
    ));
    assert!(configured.contains("placeholders"));

    let status = stdout(&kirinuki(&store, &["status", "--size", "6"]));
    assert!(status.contains("tray: ["));
    assert_eq!(status.lines().filter(|line| line.contains('.')).count(), 2);

    let settings = stdout(&kirinuki(&store, &["settings", "--visible", "4", "--width", "424"]));
    assert!(settings.contains("visible thumbs: 4 (100x66px at 424px)"));

    let finished = stdout(&kirinuki(&store, &["finish"]));
    assert!(finished.contains("puzzle cleared"));
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    assert!(saved.get("puzzlePieces").is_none());
    assert!(saved.get("puzzlePlacements").is_none());
    assert_eq!(saved["visibleThumbCount"], "4");
}

#[test]
fn configure_requires_a_selection() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");
    let output = kirinuki(&store, &["configure", "--size", "4"]);
    assert!(!output.status.success());
}
