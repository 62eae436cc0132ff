// ============================================================================
// PixelFE CLI — headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   pixelfe --new 16 --tool line --points 0,0,15,15 --color "#FF0000" -o diag.json
//   pixelfe -i art.json --tool fill --points 0,0 --color "#00F" --print
//   pixelfe -i "sprites/*.json" --select 3 --tool eraser --points 4,4 --output-dir out/
//
// Every input runs through the same editor controller the interactive front
// end uses, on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::app::{Editor, Tool};
use crate::settings::EditorSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PixelFE headless pixel-art editor.
#[derive(Parser, Debug)]
#[command(
    name = "pixelfe",
    about = "PixelFE headless batch editor",
    long_about = "Apply one tool invocation to pixel-art project files (JSON) without\n\
                  opening an editor, and optionally print the flattened result.\n\n\
                  Example:\n  \
                  pixelfe --new 8 --tool rectangle --points 1,1,6,6 --print\n  \
                  pixelfe -i \"*.json\" --tool fill --points 0,0 --color \"#FFF\" --output-dir out/"
)]
pub struct CliArgs {
    /// Input project file(s). Glob patterns accepted (e.g. "*.json").
    #[arg(short, long, num_args = 1.., required_unless_present = "new", conflicts_with = "new")]
    pub input: Vec<String>,

    /// Start from a blank grid of this side length instead of loading a file.
    #[arg(long, value_name = "SIZE")]
    pub new: Option<usize>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files keep their stem.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Tool to apply: brush, eraser, dither-brush, fill, eyedropper,
    /// magic-wand, marquee, line, rectangle, circle.
    #[arg(short, long, value_name = "NAME", requires = "points")]
    pub tool: Option<String>,

    /// Gesture points as "x,y[,x,y...]": the first is the press, the rest are
    /// drag positions.
    #[arg(short, long, value_name = "X,Y,...")]
    pub points: Option<String>,

    /// Colour token for painting tools (e.g. "#FF0000", "rgba(0,0,0,0.5)").
    #[arg(short, long, value_name = "TOKEN")]
    pub color: Option<String>,

    /// Draw filled rectangles/circles.
    #[arg(long)]
    pub filled: bool,

    /// Make this node active before applying the tool.
    #[arg(long, value_name = "ID")]
    pub select: Option<u64>,

    /// Print the flattened image as a text grid.
    #[arg(long)]
    pub print: bool,

    /// Settings file to use instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// One tool invocation parsed from the command line.
#[derive(Clone, Debug, PartialEq)]
struct ToolRun {
    tool: Tool,
    points: Vec<(i32, i32)>,
}

enum Source {
    Blank(usize),
    File(PathBuf),
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Blank(size) => format!("<new {}x{}>", size, size),
            Source::File(path) => path.display().to_string(),
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let settings_path = args.config.clone().or_else(EditorSettings::settings_path);
    let mut settings = match &settings_path {
        Some(path) => EditorSettings::load_from(path),
        None => EditorSettings::default(),
    };

    let tool_run = match parse_tool_run(args.tool.as_deref(), args.points.as_deref()) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sources: Vec<Source> = match args.new {
        Some(size) => vec![Source::Blank(size)],
        None => resolve_inputs(&args.input).into_iter().map(Source::File).collect(),
    };
    if sources.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if sources.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            sources.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let total = sources.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, source) in sources.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, source.label());
        }
        let file_start = Instant::now();

        let output_path = build_output_path(source, args.output.as_deref(), args.output_dir.as_deref());

        match run_one(source, output_path.as_deref(), &settings, tool_run.as_ref(), &args) {
            Ok(()) => {
                if args.verbose || multi {
                    let target = output_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(not saved)".to_string());
                    println!(
                        "  → {} ({:.0}ms)",
                        target,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                log_err!("{}: {}", source.label(), e);
                any_failure = true;
            }
        }
    }

    // Remember the tool, as the interactive editor does on every tool switch.
    if let Some(run) = &tool_run
        && settings.last_active_tool != run.tool.name()
        && let Some(path) = &settings_path
    {
        settings.last_active_tool = run.tool.name().to_string();
        settings.save_to(path);
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    source: &Source,
    output: Option<&Path>,
    settings: &EditorSettings,
    tool_run: Option<&ToolRun>,
    args: &CliArgs,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let mut editor = Editor::new(settings.clone());
    match source {
        Source::Blank(size) => {
            if !editor.create_grid(*size) {
                return Err(format!("grid size {} is out of range", size));
            }
        }
        Source::File(path) => {
            editor
                .open_project(path)
                .map_err(|e| format!("load failed: {}", e))?;
        }
    }

    // -- Step 2: Edit ----------------------------------------------------
    if let Some(id) = args.select
        && !editor.select_item(id)
    {
        return Err(format!("no layer or group with id {}", id));
    }
    if let Some(color) = &args.color {
        editor.set_color(color);
    }
    editor.set_filled_shapes(args.filled);
    if let Some(run) = tool_run {
        apply_tool(&mut editor, run)?;
        if args.verbose {
            println!("  {}", editor.status());
        }
    }

    // -- Step 3: Report / save -------------------------------------------
    if args.print {
        let size = editor.size();
        print!("{}", render_grid(editor.composite(), size));
    }

    if let Some(path) = output {
        editor
            .save_project_as(path.to_path_buf())
            .map_err(|e| format!("save failed: {}", e))?;
    }
    Ok(())
}

fn apply_tool(editor: &mut Editor, run: &ToolRun) -> Result<(), String> {
    editor.set_tool(run.tool);
    let Some((&(x, y), rest)) = run.points.split_first() else {
        return Err("no points given".to_string());
    };
    if !editor.begin_stroke(x, y) {
        return Err(format!("point {},{} is outside the {}-cell grid", x, y, editor.size()));
    }
    for &(x, y) in rest {
        editor.continue_stroke(x, y);
    }
    editor.end_stroke();
    log_info!("Applied {} at {} point(s)", run.tool.name(), run.points.len());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_tool_run(tool: Option<&str>, points: Option<&str>) -> Result<Option<ToolRun>, String> {
    let Some(name) = tool else { return Ok(None) };
    let tool = Tool::from_name(name).ok_or_else(|| format!("unknown tool '{}'", name))?;
    let points = parse_points(points.unwrap_or(""))?;
    Ok(Some(ToolRun { tool, points }))
}

/// `"x,y,x,y"` → `[(x, y), (x, y)]`.
fn parse_points(text: &str) -> Result<Vec<(i32, i32)>, String> {
    let numbers = text
        .split(',')
        .map(|s| s.trim().parse::<i32>().map_err(|_| format!("bad coordinate '{}'", s.trim())))
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.is_empty() || numbers.len() % 2 != 0 {
        return Err(format!("expected x,y pairs, got {} number(s)", numbers.len()));
    }
    Ok(numbers.chunks(2).map(|c| (c[0], c[1])).collect())
}

/// Composite as text, one row per line, `.` for transparent cells.
fn render_grid(composite: &[String], size: usize) -> String {
    let mut out = String::new();
    if size == 0 {
        return out;
    }
    for row in composite.chunks(size) {
        let cells: Vec<&str> = row
            .iter()
            .map(|c| if c.is_empty() { "." } else { c.as_str() })
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute where a processed source is written, if anywhere.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Files only: same directory, `<stem>_out.json`, so the input is never
///    overwritten. Blank grids without an explicit target are not saved.
fn build_output_path(source: &Source, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = match source {
        Source::Blank(_) => "untitled".to_string(),
        Source::File(path) => path.file_stem()?.to_string_lossy().into_owned(),
    };

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.json", stem)));
    }

    match source {
        Source::Blank(_) => None,
        Source::File(path) => {
            let parent = path.parent().unwrap_or(Path::new("."));
            Some(parent.join(format!("{}_out.json", stem)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::ShapeKind;

    #[test]
    fn points_parse_in_pairs() {
        assert_eq!(parse_points("0,0, 3,3").unwrap(), vec![(0, 0), (3, 3)]);
        assert!(parse_points("1,2,3").is_err());
        assert!(parse_points("a,b").is_err());
        assert!(parse_points("").is_err());
    }

    #[test]
    fn tool_run_needs_known_tool() {
        let run = parse_tool_run(Some("circle"), Some("0,0,4,4")).unwrap().unwrap();
        assert_eq!(run.tool, Tool::Shape(ShapeKind::Circle));
        assert!(parse_tool_run(Some("lasso"), Some("0,0")).is_err());
        assert_eq!(parse_tool_run(None, None).unwrap(), None);
    }

    #[test]
    fn grid_rendering() {
        let composite = vec!["#F00".to_string(), String::new(), String::new(), "#0F0".to_string()];
        assert_eq!(render_grid(&composite, 2), "#F00 .\n. #0F0\n");
    }

    #[test]
    fn output_paths() {
        let file = Source::File(PathBuf::from("art/cat.json"));
        assert_eq!(
            build_output_path(&file, None, None),
            Some(PathBuf::from("art/cat_out.json"))
        );
        assert_eq!(
            build_output_path(&file, None, Some(Path::new("out"))),
            Some(PathBuf::from("out/cat.json"))
        );
        assert_eq!(build_output_path(&Source::Blank(4), None, None), None);
    }

    #[test]
    fn new_grid_with_line_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diag.json");
        let cfg = dir.path().join("settings.cfg");
        let args = CliArgs::parse_from([
            "pixelfe", "--new", "4", "--tool", "line", "--points", "0,0,3,3", "--color", "#FF0000",
        ]
        .into_iter()
        .map(String::from)
        .chain(["-o".to_string(), out.display().to_string()])
        .chain(["--config".to_string(), cfg.display().to_string()]));
        assert_eq!(run(args), ExitCode::SUCCESS);
        assert_eq!(EditorSettings::load_from(&cfg).last_active_tool, "line");

        let tree = crate::io::load_project(&out).unwrap();
        let data = &tree.active_layer().unwrap().data;
        let painted: Vec<usize> = (0..16).filter(|&i| data[i] == "#FF0000").collect();
        assert_eq!(painted, vec![0, 5, 10, 15]);
    }

    #[test]
    fn unknown_select_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("settings.cfg");
        let args = CliArgs::parse_from(["pixelfe", "--new", "2", "--select", "99", "--config"]
            .into_iter()
            .map(String::from)
            .chain([cfg.display().to_string()]));
        assert_eq!(run(args), ExitCode::FAILURE);
        // No tool was applied, so nothing is remembered.
        assert!(!cfg.exists());
    }
}
