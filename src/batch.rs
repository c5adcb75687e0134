//
// batch.rs
// Dcm2Png-rs
//
// Walks an input directory for .dcm files and converts each one to a PNG in the output directory.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ndarray::{Axis, Ix3};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ConvertError, Result};
use crate::models::{ConversionSummary, FRAME_AXIS};
use crate::source::PixelSource;
use crate::{image, normalize, transform};

/// Settings for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub verbose: bool,
    pub contrast: bool,
    pub skip_errors: bool,
    pub frame: u32,
    pub strict_degenerate: bool,
}

pub fn validate_input_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Err(ConvertError::InputMissing {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(ConvertError::InputIsFile {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ConvertError::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Every `*.dcm` file below `dir`, sorted by path.
pub fn find_dicom_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|source| ConvertError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        // Name based, so a bare `.dcm` counts too.
        let is_dicom = entry.file_name().to_string_lossy().ends_with(".dcm");
        // `Path::is_file` follows symlinks, so linked files still count.
        if is_dicom && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// `<output_dir>/<stem>.png`; files sharing a stem in different folders overwrite each other.
/// Dots inside the stem (UID-style names) are kept.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".png");
    output_dir.join(name)
}

/// Decode, optionally window, normalize and save a single file. Returns the PNG path.
pub fn convert_file<S: PixelSource>(
    source: &S,
    input: &Path,
    options: &BatchOptions,
) -> Result<PathBuf> {
    let decoded = source.decode(input)?;
    let shape = decoded.samples.shape().to_vec();
    if shape.len() != 4 {
        return Err(ConvertError::UnsupportedShape {
            path: input.to_path_buf(),
            shape,
        });
    }

    let frames = decoded.number_of_frames();
    let frame = options.frame as usize;
    if frame >= frames {
        return Err(ConvertError::FrameOutOfRange {
            path: input.to_path_buf(),
            frame: options.frame,
            frames,
        });
    }

    let samples_per_pixel = decoded.samples_per_pixel();
    let plane = decoded
        .samples
        .index_axis_move(Axis(FRAME_AXIS), frame)
        .into_dyn();

    let plane = if options.contrast {
        transform::apply_contrast(plane, &decoded.metadata, samples_per_pixel).map_err(
            |source| ConvertError::Transform {
                path: input.to_path_buf(),
                source,
            },
        )?
    } else {
        plane
    };

    let range = match normalize::sample_range(&plane) {
        Some((min, max)) if min < max => (min, max),
        degenerate => {
            let value = degenerate.map_or(f64::NAN, |(min, _)| min);
            if options.strict_degenerate {
                return Err(ConvertError::DegenerateImage {
                    path: input.to_path_buf(),
                    value,
                });
            }
            warn!("{:?} has a constant value of {}, writing a black image", input, value);
            (value, value)
        }
    };

    let pixels = normalize::normalize_to_u8(&plane, range)
        .into_dimensionality::<Ix3>()
        .map_err(|_| ConvertError::UnsupportedShape {
            path: input.to_path_buf(),
            shape,
        })?;

    let output = output_path_for(input, &options.output_dir);
    image::save_png(pixels.view(), &output)?;
    debug!("Saved {:?} -> {:?}", input, output);
    Ok(output)
}

/// Run the whole batch: validate, enumerate, convert in path order, summarize.
pub fn convert_directory<S: PixelSource>(
    source: &S,
    options: &BatchOptions,
) -> Result<ConversionSummary> {
    convert_directory_with(source, options, &mut io::stdout().lock())
}

/// Same as [`convert_directory`], with verbose progress lines going to `out`.
pub fn convert_directory_with<S: PixelSource, W: Write>(
    source: &S,
    options: &BatchOptions,
    out: &mut W,
) -> Result<ConversionSummary> {
    validate_input_dir(&options.input_dir)?;
    prepare_output_dir(&options.output_dir)?;

    let files = find_dicom_files(&options.input_dir)?;
    if files.is_empty() {
        return Err(ConvertError::NoFilesFound {
            path: options.input_dir.clone(),
        });
    }
    info!(
        "Found {} DICOM file(s) in {:?}",
        files.len(),
        options.input_dir
    );

    let mut converted = 0;
    let mut skipped = 0;
    for path in &files {
        match convert_file(source, path, options) {
            Ok(output) => {
                converted += 1;
                if options.verbose {
                    // Progress output is best effort.
                    let _ = writeln!(out, "{}", progress_line(converted, &output));
                }
            }
            Err(e) if options.skip_errors && e.is_per_file() => {
                warn!("Skipping {:?}: {}", path, e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if converted == 0 {
        return Err(ConvertError::AllFailed { count: skipped });
    }

    Ok(ConversionSummary {
        converted,
        skipped,
        output_dir: options.output_dir.clone(),
    })
}

/// `00001: name.png saved`
pub fn progress_line(counter: usize, output: &Path) -> String {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{:05}: {} saved", counter, name)
}

pub fn summary_line(summary: &ConversionSummary) -> String {
    let mut line = format!(
        "Conversion completed. {} files saved in {}",
        summary.converted,
        summary.output_dir.display()
    );
    if summary.skipped > 0 {
        line.push_str(&format!(" ({} skipped)", summary.skipped));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LutMetadata, SourceImage, WindowLevel};
    use ndarray::{ArrayD, IxDyn};
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// Serves canned images keyed by file name, failing for anything else.
    #[derive(Default)]
    struct FakeSource {
        images: HashMap<String, SourceImage>,
    }

    impl FakeSource {
        fn with(mut self, name: &str, shape: &[usize], values: Vec<f64>) -> Self {
            self.images.insert(
                name.to_string(),
                SourceImage {
                    samples: ArrayD::from_shape_vec(IxDyn(shape), values).unwrap(),
                    metadata: LutMetadata::default(),
                },
            );
            self
        }
    }

    impl PixelSource for FakeSource {
        fn decode(&self, path: &Path) -> Result<SourceImage> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.images
                .get(&name)
                .cloned()
                .ok_or_else(|| ConvertError::Decode {
                    path: path.to_path_buf(),
                    reason: "not a fixture".into(),
                })
        }
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn options(input: &Path, output: &Path) -> BatchOptions {
        BatchOptions {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            ..BatchOptions::default()
        }
    }

    #[test]
    fn finds_dcm_files_recursively_in_path_order() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.dcm"));
        touch(&dir.path().join("a/z.dcm"));
        touch(&dir.path().join("a/notes.txt"));
        touch(&dir.path().join("c.DCM"));
        fs::create_dir_all(dir.path().join("folder.dcm")).unwrap();

        let files = find_dicom_files(dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("a/z.dcm"), PathBuf::from("b.dcm")]
        );
    }

    #[test]
    fn bare_dcm_name_is_matched() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join(".dcm"));
        touch(&dir.path().join("sub/.dcm"));
        touch(&dir.path().join("dcm"));

        let files = find_dicom_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join(".dcm"), dir.path().join("sub/.dcm")]
        );
    }

    #[test]
    fn output_name_replaces_extension() {
        let out = output_path_for(Path::new("/data/series1/img.001.dcm"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/img.001.png"));
    }

    #[test]
    fn uid_style_names_keep_every_component() {
        let first = output_path_for(Path::new("/in/1.2.840.1.dcm"), Path::new("/out"));
        let second = output_path_for(Path::new("/in/1.2.840.2.dcm"), Path::new("/out"));
        assert_eq!(first, PathBuf::from("/out/1.2.840.1.png"));
        assert_eq!(second, PathBuf::from("/out/1.2.840.2.png"));
    }

    #[test]
    fn missing_and_file_inputs_are_rejected() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            validate_input_dir(&missing),
            Err(ConvertError::InputMissing { .. })
        ));

        let file = dir.path().join("file.dcm");
        touch(&file);
        let err = validate_input_dir(&file).unwrap_err();
        assert!(err.to_string().ends_with("is a file"));
    }

    #[test]
    fn progress_and_summary_lines() {
        assert_eq!(
            progress_line(7, Path::new("/out/scan.png")),
            "00007: scan.png saved"
        );
        let summary = ConversionSummary {
            converted: 3,
            skipped: 1,
            output_dir: PathBuf::from("out"),
        };
        assert_eq!(
            summary_line(&summary),
            "Conversion completed. 3 files saved in out (1 skipped)"
        );
    }

    #[test]
    fn converts_selected_frame_of_multiframe_input() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("cine.dcm"));
        let source = FakeSource::default().with(
            "cine.dcm",
            &[2, 1, 2, 1],
            vec![0.0, 0.0, 10.0, 20.0],
        );

        let mut opts = options(input.path(), output.path());
        opts.frame = 1;
        let summary = convert_directory(&source, &opts).unwrap();
        assert_eq!(summary.converted, 1);

        let png = ::image::open(output.path().join("cine.png")).unwrap().to_luma8();
        assert_eq!(png.get_pixel(0, 0).0, [0]);
        assert_eq!(png.get_pixel(1, 0).0, [255]);

        opts.frame = 2;
        let err = convert_directory(&source, &opts).unwrap_err();
        assert!(matches!(err, ConvertError::FrameOutOfRange { frames: 2, .. }));
    }

    #[test]
    fn rgb_input_writes_color_png() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("color.dcm"));
        let source = FakeSource::default().with(
            "color.dcm",
            &[1, 1, 2, 3],
            vec![0.0, 50.0, 100.0, 150.0, 200.0, 255.0],
        );

        convert_directory(&source, &options(input.path(), output.path())).unwrap();
        let png = ::image::open(output.path().join("color.png")).unwrap();
        assert_eq!(png.as_rgb8().unwrap().get_pixel(0, 0).0[0], 0);
        assert_eq!(png.as_rgb8().unwrap().get_pixel(1, 0).0[2], 255);
    }

    #[test]
    fn degenerate_policy_is_configurable() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("flat.dcm"));
        let source = FakeSource::default().with("flat.dcm", &[1, 2, 2, 1], vec![9.0; 4]);

        let mut opts = options(input.path(), output.path());
        convert_directory(&source, &opts).unwrap();
        let png = ::image::open(output.path().join("flat.png")).unwrap().to_luma8();
        assert!(png.pixels().all(|p| p.0 == [0]));

        opts.strict_degenerate = true;
        let err = convert_directory(&source, &opts).unwrap_err();
        assert!(matches!(err, ConvertError::DegenerateImage { value, .. } if value == 9.0));
    }

    #[test]
    fn window_flattening_everything_is_degenerate() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let path = input.path().join("dark.dcm");
        touch(&path);
        let mut source = FakeSource::default().with("dark.dcm", &[1, 1, 2, 1], vec![0.0, 10.0]);
        source.images.get_mut("dark.dcm").unwrap().metadata.windows = vec![WindowLevel {
            center: 1000.0,
            width: 10.0,
        }];

        let mut opts = options(input.path(), output.path());
        opts.contrast = true;
        opts.strict_degenerate = true;
        let err = convert_file(&source, &path, &opts).unwrap_err();
        assert!(matches!(err, ConvertError::DegenerateImage { .. }));
    }

    #[test]
    fn skip_errors_continues_past_bad_files() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("a_bad.dcm"));
        touch(&input.path().join("b_good.dcm"));
        let source =
            FakeSource::default().with("b_good.dcm", &[1, 1, 2, 1], vec![1.0, 2.0]);

        let mut opts = options(input.path(), output.path());
        let err = convert_directory(&source, &opts).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
        assert!(!output.path().join("b_good.png").exists());

        opts.skip_errors = true;
        let summary = convert_directory(&source, &opts).unwrap();
        assert_eq!((summary.converted, summary.skipped), (1, 1));
        assert!(output.path().join("b_good.png").exists());
    }

    #[test]
    fn verbose_counter_counts_saved_files_only() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("a_bad.dcm"));
        touch(&input.path().join("b_good.dcm"));
        touch(&input.path().join("c_bad.dcm"));
        touch(&input.path().join("d_good.dcm"));
        let source = FakeSource::default()
            .with("b_good.dcm", &[1, 1, 2, 1], vec![1.0, 2.0])
            .with("d_good.dcm", &[1, 1, 2, 1], vec![3.0, 4.0]);

        let mut opts = options(input.path(), output.path());
        opts.skip_errors = true;
        opts.verbose = true;
        let mut log = Vec::new();
        convert_directory_with(&source, &opts, &mut log).unwrap();

        let log = String::from_utf8(log).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines, vec!["00001: b_good.png saved", "00002: d_good.png saved"]);
    }

    #[test]
    fn quiet_runs_print_nothing() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("one.dcm"));
        let source = FakeSource::default().with("one.dcm", &[1, 1, 2, 1], vec![1.0, 2.0]);

        let mut log = Vec::new();
        convert_directory_with(&source, &options(input.path(), output.path()), &mut log).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn skip_errors_still_fails_when_nothing_converts() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(&input.path().join("x.dcm"));
        touch(&input.path().join("y.dcm"));

        let mut opts = options(input.path(), output.path());
        opts.skip_errors = true;
        let err = convert_directory(&FakeSource::default(), &opts).unwrap_err();
        assert_eq!(err.to_string(), "All 2 DICOM files failed to convert");
    }

    #[test]
    fn empty_input_creates_output_but_fails() {
        let input = tempdir().unwrap();
        let output = input.path().join("nested/out");
        touch(&input.path().join("readme.txt"));

        let err =
            convert_directory(&FakeSource::default(), &options(input.path(), &output)).unwrap_err();
        assert!(matches!(err, ConvertError::NoFilesFound { .. }));
        assert!(output.is_dir());
        assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
    }

    #[test]
    fn output_dir_failure_reports_the_os_cause() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = prepare_output_dir(&blocker.join("out")).unwrap_err();
        let ConvertError::CreateOutputDir { source, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to create output directory"));
        assert!(message.ends_with(&format!(": {source}")));
    }
}
