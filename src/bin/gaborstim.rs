use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use gaborstim::{
    AntiAliasMode, CalibrationScale, CaptureSurface, EngineOpts, FieldProgram, LogicalSize, ManualClock,
    ManualRefresh, Pacing, Point, RenderMode, StimulusEngine, StimulusParameters, StimulusPatch,
    SyncDriver, device_canvas, refresh_interval,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gaborstim", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the stimulus at explicit fragment coordinates and print JSON.
    Probe(ProbeArgs),
    /// Drive the engine headless for a number of frames and print run stats as JSON.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct StimulusArgs {
    /// Parameter JSON (full or partial record, camelCase keys).
    #[arg(long)]
    params: Option<PathBuf>,

    /// Engine options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stimulus to render.
    #[arg(long, default_value = "gabor")]
    mode: RenderMode,

    /// Calibration in device pixels per degree of visual angle.
    #[arg(long)]
    px_per_deg: Option<f64>,

    /// Integrate the carrier over each pixel footprint.
    #[arg(long)]
    anti_alias: bool,

    /// Display-area width in logical pixels.
    #[arg(long, default_value_t = 640.0)]
    width: f64,

    /// Display-area height in logical pixels.
    #[arg(long, default_value_t = 480.0)]
    height: f64,

    /// Host device pixel ratio (clamped by the engine options).
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    #[command(flatten)]
    stim: StimulusArgs,

    /// Elapsed running time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Fragment coordinate `x,y` in device pixels (origin bottom-left). Repeatable.
    #[arg(long = "at", value_parser = parse_point, required = true)]
    at: Vec<Point>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    stim: StimulusArgs,

    /// Number of refreshes to deliver.
    #[arg(long, default_value_t = 60)]
    frames: usize,

    /// Refresh rate in Hz.
    #[arg(long, default_value_t = 60.0)]
    hz: f64,

    /// Sleep between refreshes and use the wall clock instead of simulated time.
    #[arg(long)]
    realtime: bool,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeSample {
    x: f64,
    y: f64,
    luminance: f64,
    display_value: f64,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeReport {
    mode: RenderMode,
    anti_alias: AntiAliasMode,
    width: u32,
    height: u32,
    elapsed_secs: f64,
    samples: Vec<ProbeSample>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    frames_presented: u64,
    resizes: u64,
    elapsed_secs: f64,
    width: u32,
    height: u32,
    last_frame_mean: f64,
    last_frame_min: u8,
    last_frame_max: u8,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Probe(args) => cmd_probe(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok(Point::new(x, y))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn load_params(args: &StimulusArgs) -> anyhow::Result<StimulusParameters> {
    let patch: StimulusPatch = match &args.params {
        Some(p) => read_json(p, "parameters")?,
        None => StimulusPatch::default(),
    };
    Ok(StimulusParameters::default().merged(&patch))
}

fn load_opts(args: &StimulusArgs) -> anyhow::Result<EngineOpts> {
    let opts: EngineOpts = match &args.config {
        Some(p) => read_json(p, "engine options")?,
        None => EngineOpts::default(),
    };
    opts.validate()?;
    Ok(opts)
}

fn load_calibration(args: &StimulusArgs) -> anyhow::Result<Option<CalibrationScale>> {
    args.px_per_deg
        .map(|v| {
            CalibrationScale::new(v)
                .with_context(|| format!("--px-per-deg must be finite and > 0, got {v}"))
        })
        .transpose()
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let params = load_params(&args.stim)?;
    let opts = load_opts(&args.stim)?;
    let px_per_deg = load_calibration(&args.stim)?
        .map_or(opts.default_px_per_deg, |s| s.px_per_deg());
    let aa = AntiAliasMode::from_enabled(args.stim.anti_alias);

    let canvas = device_canvas(
        LogicalSize::new(args.stim.width, args.stim.height),
        args.stim.dpr,
        opts.dpr,
        opts.fallback_logical_size,
    );
    let program = FieldProgram::calibrate(
        args.stim.mode,
        &params,
        px_per_deg,
        opts.min_sigma_px,
        canvas.resolution(),
        args.time,
    );

    let samples = args
        .at
        .iter()
        .map(|&p| ProbeSample {
            x: p.x,
            y: p.y,
            luminance: program.luminance(p, aa),
            display_value: program.display_value(p, aa),
        })
        .collect();

    let report = ProbeReport {
        mode: args.stim.mode,
        anti_alias: aa,
        width: canvas.width,
        height: canvas.height,
        elapsed_secs: args.time,
        samples,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let params = load_params(&args.stim)?;
    let opts = load_opts(&args.stim)?;
    let calibration = load_calibration(&args.stim)?;

    let logical = LogicalSize::new(args.stim.width, args.stim.height);
    let surface = CaptureSurface::new(logical, args.stim.dpr).with_history_limit(1);
    let interval = refresh_interval(args.hz);

    let clock = ManualClock::new();
    let (mut engine, driver) = if args.realtime {
        let engine = StimulusEngine::attach(surface, ManualRefresh::new(), opts)?;
        (engine, SyncDriver::new(interval, Pacing::Realtime))
    } else {
        let engine = StimulusEngine::attach_with_clock(
            surface,
            ManualRefresh::new(),
            Box::new(clock.clone()),
            opts,
        )?;
        (engine, SyncDriver::new(interval, Pacing::Simulated(clock)))
    };

    engine.set_demo(args.stim.mode);
    engine.set_parameters(params);
    if let Some(scale) = calibration {
        engine.set_calibration(scale.px_per_deg());
    }
    engine.set_anti_alias(args.stim.anti_alias);

    let presented = driver.run(&mut engine, args.frames)?;
    tracing::info!(presented, hz = args.hz, "run finished");

    let stats = engine.stats();
    let last = engine
        .surface()
        .last_frame()
        .context("engine presented no frames")?;
    let lum: Vec<u8> = last.data.chunks_exact(4).map(|px| px[0]).collect();
    let mean = lum.iter().map(|&v| f64::from(v)).sum::<f64>() / lum.len().max(1) as f64;
    let report = RunReport {
        frames_presented: stats.frames_presented,
        resizes: stats.resizes,
        elapsed_secs: stats.last_elapsed_secs,
        width: last.width,
        height: last.height,
        last_frame_mean: mean / 255.0,
        last_frame_min: lum.iter().copied().min().unwrap_or(0),
        last_frame_max: lum.iter().copied().max().unwrap_or(0),
    };
    engine.destroy();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
