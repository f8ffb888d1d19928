use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use subclip::{
    ClipKind, ClipOptions, ClipPlan, Clipper, CollectingDiagnostics, FfmpegExtractor,
    FfmpegLogLevel, InvalidWindowPolicy, MatchSpan, MediaFile, OutputTemplate, ProgressCallback,
    MAX_ADJUSTMENT_SECONDS, ProgressInfo, Selection, SelectionMode, SubtitleEntry,
    WindowAdjustment,
};

const CLI_AFTER_HELP: &str = "Examples:\n  subclip movie.mkv movie.srt \"i'll be back\" back.mkv\n  subclip movie.mkv movie.srt hello 'hello_*.mkv' --mode all --predict-window --window-pad 0.5\n  subclip movie.mkv embedded goodbye bye.wav --audio-only\n  subclip movie.mkv movie.srt hello out.mkv --list --json\n  subclip --completions zsh > _subclip";

#[derive(Debug, Parser)]
#[command(
    name = "subclip",
    version,
    about = "Cut clips from a video wherever its subtitles match a pattern",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input media file.
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Subtitle file (.srt), or `embedded` to read the input's own text track.
    #[arg(required_unless_present = "completions")]
    subtitles: Option<String>,

    /// Pattern to search for (a regular expression unless --literal).
    #[arg(required_unless_present = "completions")]
    pattern: Option<String>,

    /// Output path; `*` is replaced with the clip number in multi-clip modes.
    #[arg(required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Seconds to move each window by (negative moves it earlier).
    #[arg(short = 'w', long, allow_negative_numbers = true, value_parser = parse_seconds)]
    window_slide: Option<f64>,

    /// Seconds to widen each window by on both sides (negative shrinks it).
    #[arg(short = 'p', long, allow_negative_numbers = true, value_parser = parse_seconds)]
    window_pad: Option<f64>,

    /// Estimate where in the subtitle the words are spoken.
    #[arg(short = 'P', long)]
    predict_window: bool,

    /// Write audio only, as a WAV file.
    #[arg(short = 'A', long)]
    audio_only: bool,

    /// Match case-sensitively.
    #[arg(short = 'C', long)]
    case_sensitive: bool,

    /// Which matches to clip: first, all, or interactive.
    #[arg(short = 'm', long, default_value = "first")]
    mode: SelectionMode,

    /// Treat the pattern as plain text.
    #[arg(long)]
    literal: bool,

    /// Skip entries whose window is invalid instead of aborting.
    #[arg(long)]
    skip_invalid: bool,

    /// Zero-based embedded subtitle track to read with `embedded`.
    #[arg(long)]
    subtitle_track: Option<usize>,

    /// Print matches and their windows without extracting anything.
    #[arg(long)]
    list: bool,

    /// Print results as machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// Show a progress bar while clips are written.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long)]
    ffmpeg_log_level: Option<FfmpegLogLevel>,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, exclusive = true)]
    completions: Option<Shell>,
}

/// Where the subtitle entries come from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SubtitleSource {
    File(PathBuf),
    Embedded,
}

/// Signed seconds for slide and pad, finite and within the accepted range.
fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("{value:?} is not a number of seconds"))?;
    if !seconds.is_finite() || seconds.abs() > MAX_ADJUSTMENT_SECONDS {
        return Err(format!(
            "{value:?} must be a finite number of seconds within ±{MAX_ADJUSTMENT_SECONDS:.0}"
        ));
    }
    Ok(seconds)
}

fn parse_subtitle_source(value: &str) -> SubtitleSource {
    if value.eq_ignore_ascii_case("embedded") {
        SubtitleSource::Embedded
    } else {
        SubtitleSource::File(PathBuf::from(value))
    }
}

fn load_entries(
    source: &SubtitleSource,
    input: &Path,
    track: Option<usize>,
) -> Result<Vec<SubtitleEntry>, Box<dyn std::error::Error>> {
    let entries = match source {
        SubtitleSource::File(path) => subclip::load_srt(path)?,
        SubtitleSource::Embedded => {
            let mut media = MediaFile::open(input)?;
            match track {
                Some(track) => media.subtitle_track_entries(track)?,
                None => media.subtitle_entries()?,
            }
        }
    };
    log::debug!("Loaded {} subtitle entries", entries.len());
    Ok(entries)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// Split `text` into runs, flagging the runs covered by `spans`.
///
/// Spans are character offsets; runs past the end of `text` are ignored.
fn split_spans(text: &str, spans: &[MatchSpan]) -> Vec<(String, bool)> {
    let characters: Vec<char> = text.chars().collect();
    let mut runs = Vec::new();
    let mut cursor = 0;

    for span in spans {
        let start = span.start.min(characters.len());
        let end = span.end.min(characters.len());
        if start < cursor || start >= end {
            continue;
        }
        if start > cursor {
            runs.push((characters[cursor..start].iter().collect(), false));
        }
        runs.push((characters[start..end].iter().collect(), true));
        cursor = end;
    }
    if cursor < characters.len() {
        runs.push((characters[cursor..].iter().collect(), false));
    }
    runs
}

/// Entry text with the matched spans highlighted.
///
/// Spans index the normalized text. When lowercasing changed the character
/// count the normalized text is shown instead of the original.
fn highlight(entry: &SubtitleEntry) -> String {
    let text = if entry.text.chars().count() == entry.normalized_text().chars().count() {
        entry.text.as_str()
    } else {
        entry.normalized_text()
    };

    split_spans(text, entry.match_spans())
        .into_iter()
        .map(|(run, matched)| {
            if matched {
                run.red().bold().to_string()
            } else {
                run
            }
        })
        .collect()
}

fn print_matches(matches: &[SubtitleEntry]) {
    for (position, entry) in matches.iter().enumerate() {
        println!(
            "{} {} --> {}",
            format!("[{position}]").cyan().bold(),
            subclip::format_timestamp(entry.start),
            subclip::format_timestamp(entry.end)
        );
        println!("{}\n", highlight(entry));
    }
}

fn prompt_selection(match_count: usize) -> Result<Selection, Box<dyn std::error::Error>> {
    eprint!("{} ", "select clips (e.g. 0,2,3):".bold());
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(Selection::parse(&line, match_count)?)
}

fn plan_json(plan: &ClipPlan, output: Option<&Path>) -> serde_json::Value {
    json!({
        "ordinal": plan.ordinal,
        "subtitle_index": plan.entry.index,
        "text": plan.entry.text,
        "subtitle_start": plan.entry.start.as_secs_f64(),
        "subtitle_end": plan.entry.end.as_secs_f64(),
        "spans": plan.entry.match_spans().iter().map(|span| [span.start, span.end]).collect::<Vec<_>>(),
        "window_start": plan.window.start.as_secs_f64(),
        "window_end": plan.window.end.as_secs_f64(),
        "output": output.map(|path| path.display().to_string()),
    })
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if let Some(path) = &info.current_output {
            self.bar.set_message(path.display().to_string());
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "subclip", &mut io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose);
    let ffmpeg_level = cli.ffmpeg_log_level.unwrap_or(if cli.verbose {
        FfmpegLogLevel::Warning
    } else {
        FfmpegLogLevel::Error
    });
    subclip::set_ffmpeg_log_level(ffmpeg_level);

    let (Some(input), Some(subtitles), Some(pattern), Some(output)) =
        (&cli.input, &cli.subtitles, &cli.pattern, &cli.output)
    else {
        return Err("INPUT, SUBTITLES, PATTERN and OUTPUT are required".into());
    };

    let entries = load_entries(&parse_subtitle_source(subtitles), input, cli.subtitle_track)?;

    let mut adjustment = WindowAdjustment::new();
    if let Some(slide) = cli.window_slide {
        adjustment = adjustment.with_slide(slide);
    }
    if let Some(pad) = cli.window_pad {
        adjustment = adjustment.with_pad(pad);
    }

    let diagnostics = Arc::new(CollectingDiagnostics::new());
    let mut options = ClipOptions::new()
        .with_case_sensitive(cli.case_sensitive)
        .with_literal(cli.literal)
        .with_prediction(cli.predict_window)
        .with_adjustment(adjustment)
        .with_mode(cli.mode)
        .with_kind(if cli.audio_only {
            ClipKind::AudioOnly
        } else {
            ClipKind::Video
        })
        .with_invalid_window_policy(if cli.skip_invalid {
            InvalidWindowPolicy::Skip
        } else {
            InvalidWindowPolicy::Abort
        })
        .with_diagnostics(diagnostics.clone());

    if cli.list {
        let clipper = Clipper::new(options);
        let matches = clipper.find(&entries, pattern)?;
        let plans = clipper.plan(&matches, &Selection::All)?;
        if cli.json {
            let payload = json!({
                "pattern": pattern,
                "matches": plans.iter().map(|plan| plan_json(plan, None)).collect::<Vec<_>>(),
                "diagnostics": diagnostics.take().iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            for (position, plan) in plans.iter().enumerate() {
                println!(
                    "{} {} --> {}  {} {}",
                    format!("[{position}]").cyan().bold(),
                    subclip::format_timestamp(plan.entry.start),
                    subclip::format_timestamp(plan.entry.end),
                    "clip".dimmed(),
                    plan.window
                );
                println!("{}\n", highlight(&plan.entry));
            }
        }
        return Ok(());
    }

    // The bar length is only known after selection, so matching runs first.
    let matches = Clipper::new(options.clone()).find(&entries, pattern)?;
    let selection = match cli.mode.selection() {
        Some(selection) => selection,
        None => {
            print_matches(&matches);
            prompt_selection(matches.len())?
        }
    };
    let selected_count = selection.apply(&matches)?.len();

    let planner = Clipper::new(options.clone());
    let plans = planner.plan(&matches, &selection)?;
    if plans.len() < selected_count {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "skipped {} of {selected_count} selected subtitles with invalid windows",
                selected_count - plans.len()
            )
            .yellow()
        );
    }

    let template = OutputTemplate::new(output);
    for plan in &plans {
        ensure_writable_path(&template.resolve(plan.ordinal, cli.mode.is_multi()), cli.overwrite)?;
    }

    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new(plans.len() as u64)?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let clipper = Clipper::new(options);
    let report = clipper.run(&plans, input, &template, &mut FfmpegExtractor::new())?;

    if let Some(progress) = progress {
        progress.finish();
    }

    if cli.json {
        let payload = json!({
            "pattern": pattern,
            "clips": plans
                .iter()
                .zip(&report.clips)
                .map(|(plan, clip)| plan_json(plan, Some(clip.path.as_path())))
                .collect::<Vec<_>>(),
            "diagnostics": diagnostics.take().iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for clip in &report.clips {
            println!(
                "{} {} ({})",
                "saved".green().bold(),
                clip.path.display(),
                clip.window
            );
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
