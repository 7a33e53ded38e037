use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use photo_tools::cli::OutputFormat;
use photo_tools::image_processing::{
    convert_directory, ConvertOptions, ImageCrateDecoder, SourceDecoder,
};
use photo_tools::utils::CancelToken;
use photo_tools::Error;

/// Decodes normally, then removes the source so the later delete step fails
struct VanishingSourceDecoder;

impl SourceDecoder for VanishingSourceDecoder {
    fn decode(&self, path: &Path) -> photo_tools::Result<DynamicImage> {
        let img = ImageCrateDecoder.decode(path)?;
        fs::remove_file(path)?;
        Ok(img)
    }
}

/// A `.heic`-named file whose content is really PNG, so the content-sniffing
/// decoder can read it without ImageMagick.
fn write_fake_heic(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 90]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

fn options(dir: &Path, format: OutputFormat) -> ConvertOptions {
    ConvertOptions {
        directory: dir.to_path_buf(),
        format,
        ..ConvertOptions::default()
    }
}

fn sorted_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn converts_every_heic_and_keeps_originals() {
    let dir = tempfile::tempdir().unwrap();
    write_fake_heic(dir.path(), "a.heic", 8, 6);
    write_fake_heic(dir.path(), "B.HEIC", 5, 9);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let summary =
        convert_directory(&options(dir.path(), OutputFormat::Jpeg), &ImageCrateDecoder, |_| {})
            .unwrap();

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        sorted_entries(dir.path()),
        vec!["B.HEIC", "B.jpg", "a.heic", "a.jpg", "notes.txt"]
    );

    let decoded = image::open(dir.path().join("B.jpg")).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (5, 9));
}

#[test]
fn writes_requested_format() {
    let dir = tempfile::tempdir().unwrap();
    write_fake_heic(dir.path(), "pic.heic", 4, 4);

    for format in [OutputFormat::Png, OutputFormat::Webp] {
        let summary =
            convert_directory(&options(dir.path(), format), &ImageCrateDecoder, |_| {}).unwrap();
        assert_eq!(summary.succeeded, 1);

        let output = dir.path().join(format!("pic.{}", format.extension()));
        let guessed = image::ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(guessed, Some(format.image_format()));
    }
}

#[test]
fn directory_without_heic_files_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("photo.jpg"), "not touched").unwrap();

    let summary =
        convert_directory(&options(dir.path(), OutputFormat::Jpeg), &ImageCrateDecoder, |_| {})
            .unwrap();

    assert_eq!(summary.total(), 0);
    assert_eq!(sorted_entries(dir.path()), vec!["photo.jpg"]);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let result = convert_directory(&options(&missing, OutputFormat::Jpeg), &ImageCrateDecoder, |_| {});
    assert!(matches!(result, Err(Error::DirectoryNotFound { .. })));
}

#[test]
fn undecodable_file_counts_one_failure_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_fake_heic(dir.path(), "good.heic", 4, 4);
    fs::write(dir.path().join("broken.heic"), b"definitely not an image").unwrap();

    let reported = Mutex::new(Vec::new());
    let summary = convert_directory(
        &ConvertOptions {
            delete_original: true,
            ..options(dir.path(), OutputFormat::Png)
        },
        &ImageCrateDecoder,
        |outcome| reported.lock().unwrap().push(outcome.input.clone()),
    )
    .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(reported.into_inner().unwrap().len(), 2);

    let failed = summary.outcomes.iter().find(|o| !o.is_success()).unwrap();
    assert!(failed.input.ends_with("broken.heic"));
    assert!(!failed.deleted_original);
    assert!(failed.message().starts_with(" Failed to convert broken.heic:"));

    // The broken source stays, the good one was replaced by its PNG
    assert_eq!(sorted_entries(dir.path()), vec!["broken.heic", "good.png"]);
}

#[test]
fn delete_original_removes_converted_sources() {
    let dir = tempfile::tempdir().unwrap();
    write_fake_heic(dir.path(), "one.heic", 3, 3);
    write_fake_heic(dir.path(), "two.heic", 3, 3);

    let summary = convert_directory(
        &ConvertOptions {
            delete_original: true,
            ..options(dir.path(), OutputFormat::Jpeg)
        },
        &ImageCrateDecoder,
        |_| {},
    )
    .unwrap();

    assert!(summary.outcomes.iter().all(|o| o.deleted_original));
    assert_eq!(
        summary.outcomes[0].message(),
        " Converted and deleted: one.heic -> one.jpg"
    );
    assert_eq!(sorted_entries(dir.path()), vec!["one.jpg", "two.jpg"]);
}

#[test]
fn sequential_and_parallel_agree() {
    let run = |parallel: bool| {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..6 {
            write_fake_heic(dir.path(), &format!("img_{}.heic", i), 6 + i, 4);
        }
        fs::write(dir.path().join("bad.heic"), b"garbage").unwrap();

        let summary = convert_directory(
            &ConvertOptions {
                parallel,
                jobs: 3,
                ..options(dir.path(), OutputFormat::Png)
            },
            &ImageCrateDecoder,
            |_| {},
        )
        .unwrap();

        let outputs: Vec<(String, Vec<u8>)> = sorted_entries(dir.path())
            .into_iter()
            .filter(|name| name.ends_with(".png"))
            .map(|name| {
                let pixels = image::open(dir.path().join(&name)).unwrap().to_rgb8().into_raw();
                (name, pixels)
            })
            .collect();
        let statuses: Vec<(String, bool)> = summary
            .outcomes
            .iter()
            .map(|o| (o.input.file_name().unwrap().to_string_lossy().into_owned(), o.is_success()))
            .collect();

        (summary.succeeded, summary.failed, statuses, outputs)
    };

    let sequential = run(false);
    let parallel = run(true);
    assert_eq!(sequential.0, 6);
    assert_eq!(sequential.1, 1);
    assert_eq!(sequential, parallel);
}

#[test]
fn failed_delete_counts_as_failure_and_keeps_output() {
    let dir = tempfile::tempdir().unwrap();
    write_fake_heic(dir.path(), "gone.heic", 4, 4);

    let summary = convert_directory(
        &ConvertOptions {
            delete_original: true,
            ..options(dir.path(), OutputFormat::Png)
        },
        &VanishingSourceDecoder,
        |_| {},
    )
    .unwrap();

    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 1);

    let outcome = &summary.outcomes[0];
    assert!(!outcome.is_success());
    assert!(!outcome.deleted_original);
    assert!(outcome.message().starts_with(" Failed to convert gone.heic:"));
    assert!(dir.path().join("gone.png").exists());
}

#[test]
fn cancelled_run_is_interrupted_and_converts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_fake_heic(dir.path(), "a.heic", 4, 4);
    write_fake_heic(dir.path(), "b.heic", 4, 4);

    let cancel = CancelToken::new();
    cancel.cancel();
    let reported = Mutex::new(0);

    let result = convert_directory(
        &ConvertOptions {
            cancel,
            ..options(dir.path(), OutputFormat::Jpeg)
        },
        &ImageCrateDecoder,
        |_| *reported.lock().unwrap() += 1,
    );

    assert!(matches!(result, Err(Error::Interrupted)));
    assert_eq!(reported.into_inner().unwrap(), 0);
    assert_eq!(sorted_entries(dir.path()), vec!["a.heic", "b.heic"]);
}
