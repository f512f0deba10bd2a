use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tween_engine_core::{
    EngineConfig, PlaybackClock, TimedEntity, TimingConfig, TraceEntry, TraceRecorder,
};

fn main() -> tween_engine_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            deltas,
            time_scale,
            json,
        } => run_simulate(&config, &deltas, time_scale, json),
        Commands::Inspect { config } => run_inspect(&config),
    }
}

fn run_simulate(
    config: &PathBuf,
    deltas: &[i32],
    time_scale: Option<f32>,
    json: bool,
) -> tween_engine_core::Result<()> {
    let timing = TimingConfig::from_path(config)?;
    tracing::info!(?config, ?timing, steps = deltas.len(), "starting simulation");

    let recorder = TraceRecorder::new();
    let mut entity = TimedEntity::with_config(recorder.clone(), &timing, &EngineConfig::default())?;
    recorder.attach(&mut entity);
    entity.start();

    let mut clock = time_scale.map(PlaybackClock::new);
    let mut report = Vec::with_capacity(deltas.len());

    for &frame_millis in deltas {
        let delta = match clock.as_mut() {
            Some(clock) => clock.advance(frame_millis as f32 / 1000.0),
            None => frame_millis,
        };
        entity.update(delta);

        let entries = recorder.take();
        let snapshot = entity.snapshot();
        tracing::debug!(delta, ?snapshot, "step applied");

        if json {
            report.push(serde_json::json!({
                "delta_millis": delta,
                "entries": entries,
                "state": snapshot,
            }));
        } else {
            println!(
                "{delta:>+8}ms  iteration {:>3}  local {:>6}ms{}",
                snapshot.iteration,
                snapshot.elapsed_millis,
                if snapshot.finished { "  [finished]" } else { "" }
            );
            for entry in &entries {
                println!("            {}", describe(entry));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    tracing::info!(finished = entity.is_finished(), "simulation done");
    Ok(())
}

fn run_inspect(config: &PathBuf) -> tween_engine_core::Result<()> {
    let timing = TimingConfig::from_path(config)?;
    let entity = TimedEntity::with_config(TraceRecorder::new(), &timing, &EngineConfig::default())?;

    println!("delay          {}ms", entity.delay());
    println!("duration       {}ms", entity.duration());
    println!("repeat count   {}", entity.repeat_count());
    println!("repeat delay   {}ms", entity.repeat_delay());
    println!("yoyo           {}", entity.is_yoyo());
    match entity.full_duration() {
        Some(full) => println!("full duration  {full}ms"),
        None if entity.repeat_count() < 0 => println!("full duration  infinite"),
        None => println!("full duration  out of range"),
    }
    Ok(())
}

fn describe(entry: &TraceEntry) -> String {
    let direction = |reversed: bool| if reversed { " (reversed)" } else { "" };
    match entry {
        TraceEntry::Event { kind } => format!("event {kind:?}"),
        TraceEntry::Initialize => "initialize".to_string(),
        TraceEntry::Compute {
            iteration,
            local_millis,
            reversed,
            ..
        } => format!(
            "compute iteration {iteration} at {local_millis}ms{}",
            direction(*reversed)
        ),
        TraceEntry::ForceStart {
            iteration,
            reversed,
        } => format!("force start of iteration {iteration}{}", direction(*reversed)),
        TraceEntry::ForceEnd {
            iteration,
            reversed,
        } => format!("force end of iteration {iteration}{}", direction(*reversed)),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Step a tween timing configuration frame by frame", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Feed a sequence of frame deltas to an entity and print what happens.
    Simulate {
        /// JSON timing configuration.
        #[arg(short, long)]
        config: PathBuf,
        /// Comma separated frame deltas in milliseconds; negative values rewind.
        #[arg(
            short,
            long,
            required = true,
            value_delimiter = ',',
            allow_negative_numbers = true
        )]
        deltas: Vec<i32>,
        /// Scale every frame through a playback clock (negative plays backwards).
        #[arg(short, long, allow_negative_numbers = true)]
        time_scale: Option<f32>,
        /// Emit the trace as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the timing summary of a configuration.
    Inspect {
        /// JSON timing configuration.
        config: PathBuf,
    },
}
