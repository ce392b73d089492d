// ============================================================================
// PaintLite CLI — the menu actions, headless
// ============================================================================
//
// Usage examples:
//   paintlite -i photo.png --grayscale -o gray.jpg
//   paintlite -i photo.png --stroke "10,10;10,50;40,50" -o sketched.png
//   paintlite -i "shots/*.jpg" --grayscale --output-dir out/ --format gif
//
// No window is opened. Every input goes through the same `EditSession` the
// GUI uses: open → optional stroke → optional grayscale → save.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::error::EditorError;
use crate::io::{OPEN_FILTER, SaveFormat};
use crate::ops::stroke::BrushState;
use crate::session::{EditSession, PointerSample};
use crate::settings::EditorSettings;

/// PaintLite headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "paintlite",
    about = "PaintLite headless mode: open, draw, grayscale and save without the GUI"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpg, bmp, gif. Inferred from --output otherwise.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Apply the grayscale filter before saving.
    #[arg(short, long)]
    pub grayscale: bool,

    /// Draw one freehand stroke through the given points, e.g. "10,10;10,50".
    #[arg(long, value_name = "POINTS")]
    pub stroke: Option<String>,

    /// Settings file to read instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }

    pub fn settings(&self) -> EditorSettings {
        match &self.config {
            Some(path) => EditorSettings::load_from(path),
            None => EditorSettings::load(),
        }
    }
}

/// Run all CLI processing and return an OS exit code.
pub fn run(args: CliArgs, settings: &EditorSettings) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let stroke = match args.stroke.as_deref().map(parse_stroke).transpose() {
        Ok(points) => points,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let format = resolve_format(args.format.as_deref(), args.output.as_deref(), settings.default_save_format);
    let job = Job {
        brush: settings.brush,
        stroke: stroke.as_deref(),
        grayscale: args.grayscale,
        format,
    };

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let start = Instant::now();

        let Some(output_path) = build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref(), format)
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match job.run(input_path, &output_path) {
            Ok(()) => {
                log::info!("{} -> {}", input_path.display(), output_path.display());
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log::error!("{}: {}", input_path.display(), e);
                eprintln!("  error: {e}");
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// What to do with every input file.
struct Job<'a> {
    brush: BrushState,
    stroke: Option<&'a [(f32, f32)]>,
    grayscale: bool,
    format: SaveFormat,
}

impl Job<'_> {
    fn run(&self, input: &Path, output: &Path) -> Result<(), EditorError> {
        let mut session = EditSession::new(self.brush);
        session.open(BufReader::new(File::open(input)?))?;

        if let Some(points) = self.stroke {
            replay_stroke(&mut session, points);
        }
        if self.grayscale {
            session.apply_grayscale();
        }

        let mut file = File::create(output)?;
        session.save(&mut file, self.format)?;
        Ok(())
    }
}

/// Feed `points` to the session as one press-and-drag gesture.
pub fn replay_stroke(session: &mut EditSession, points: &[(f32, f32)]) {
    let Some((&first, rest)) = points.split_first() else { return };
    session.pointer_down(first);
    for &pos in rest {
        session.pointer_move(PointerSample { pos, primary_down: true });
    }
    session.pointer_up();
}

/// Parse "x,y;x,y;…" into points.
pub fn parse_stroke(spec: &str) -> Result<Vec<(f32, f32)>, EditorError> {
    spec.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| -> Result<(f32, f32), EditorError> {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| EditorError::InvalidStroke(pair.to_string()))?;
            let x: f32 = x.trim().parse().map_err(|_| EditorError::InvalidStroke(pair.to_string()))?;
            let y: f32 = y.trim().parse().map_err(|_| EditorError::InvalidStroke(pair.to_string()))?;
            Ok((x, y))
        })
        .collect()
}

/// Expand literal paths and glob patterns into an ordered, deduplicated list
/// of files the Open dialog would accept. Glob matches with other extensions
/// are skipped; a literal path is always kept so its decode error surfaces.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let literal = Path::new(pattern);
        if literal.is_file() {
            push_unique(&mut result, literal.to_path_buf());
            continue;
        }

        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("invalid glob '{}': {}", pattern, e);
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
                continue;
            }
        };
        let before = result.len();
        for path in entries.flatten().filter(|p| p.is_file() && is_openable(p)) {
            push_unique(&mut result, path);
        }
        if result.len() == before {
            eprintln!("warning: pattern '{}' matched no image files.", pattern);
        }
    }

    result
}

fn push_unique(paths: &mut Vec<PathBuf>, path: PathBuf) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}

/// Whether the path's extension is one of the Open filter's.
fn is_openable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| OPEN_FILTER.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// `--format` wins, then the `--output` extension, then the configured default.
fn resolve_format(format_arg: Option<&str>, output: Option<&Path>, fallback: SaveFormat) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::from_extension(f);
    }
    match output {
        Some(out) => SaveFormat::from_path(out),
        None => fallback,
    }
}

/// Where one input's result goes.
///
/// An explicit `--output` is used as-is. Otherwise the file keeps its stem
/// and takes the save format's extension, inside `--output-dir` when given or
/// next to the input. A result that would land on the input itself gets an
/// `_out` suffix.
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy();
    let dir = match output_dir {
        Some(dir) => dir,
        None => input.parent().unwrap_or(Path::new(".")),
    };
    let named = |suffix: &str| dir.join(format!("{stem}{suffix}.{}", format.extension()));

    let candidate = named("");
    Some(if candidate == input { named("_out") } else { candidate })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stroke_points() {
        assert_eq!(parse_stroke("10,10; 10.5,50 ;").unwrap(), vec![(10.0, 10.0), (10.5, 50.0)]);
        assert!(matches!(parse_stroke("10;20"), Err(EditorError::InvalidStroke(_))));
        assert!(matches!(parse_stroke("a,b"), Err(EditorError::InvalidStroke(_))));
    }

    #[test]
    fn format_precedence() {
        let out = Path::new("x.bmp");
        assert_eq!(resolve_format(Some("gif"), Some(out), SaveFormat::Png), SaveFormat::Gif);
        assert_eq!(resolve_format(None, Some(out), SaveFormat::Png), SaveFormat::Bmp);
        assert_eq!(resolve_format(None, None, SaveFormat::Jpeg), SaveFormat::Jpeg);
    }

    #[test]
    fn output_path_avoids_overwriting_input() {
        let input = Path::new("dir/photo.png");
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Png),
            Some(PathBuf::from("dir/photo_out.png"))
        );
        assert_eq!(
            build_output_path(input, None, None, SaveFormat::Gif),
            Some(PathBuf::from("dir/photo.gif"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), SaveFormat::Bmp),
            Some(PathBuf::from("out/photo.bmp"))
        );
    }

    #[test]
    fn globbed_inputs_skip_non_images() {
        let dir = std::env::temp_dir().join(format!("paintlite-glob-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["a.png", "b.JPG", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let pattern = dir.join("*").to_string_lossy().into_owned();
        let mut found = resolve_inputs(&[pattern.clone(), pattern]);
        found.sort();
        assert_eq!(found, vec![dir.join("a.png"), dir.join("b.JPG")]);

        let literal = dir.join("notes.txt");
        assert_eq!(resolve_inputs(&[literal.to_string_lossy().into_owned()]), vec![literal]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn output_dir_never_overwrites_input() {
        let input = Path::new("out/photo.png");
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), SaveFormat::Png),
            Some(PathBuf::from("out/photo_out.png"))
        );
    }

    #[test]
    fn cli_args_parse() {
        let args = CliArgs::try_parse_from(["paintlite", "-i", "a.png", "b.png", "--grayscale", "--output-dir", "o"])
            .unwrap();
        assert_eq!(args.input, vec!["a.png".to_string(), "b.png".to_string()]);
        assert!(args.grayscale);
        assert_eq!(args.output_dir, Some(PathBuf::from("o")));
    }

    #[test]
    fn job_runs_end_to_end_on_disk() {
        let dir = std::env::temp_dir().join(format!("paintlite-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.png");
        let output = dir.join("out.bmp");
        image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]))
            .save(&input)
            .unwrap();

        let points = [(10.0, 10.0), (10.0, 50.0)];
        let job = Job { brush: BrushState::default(), stroke: Some(&points), grayscale: true, format: SaveFormat::Bmp };
        job.run(&input, &output).unwrap();

        let result = image::open(&output).unwrap().to_rgba8();
        assert_eq!(result.get_pixel(10, 30).0, [0, 0, 0, 255]);
        assert_eq!(result.get_pixel(40, 30).0, [255, 255, 255, 255]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
