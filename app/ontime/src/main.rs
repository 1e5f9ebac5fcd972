use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ontime::config::{Overrides, Settings};
use ontime::form::{FormEvent, FormSession};
use ontime::present::{render, render_error, OutputMode};
use ontime_insight::{
    CityType, ConcurrentDeliveries, DistanceKm, DriverAge, DriverRating, Festival,
    PredictionContext, ShipmentRecord, TrafficDensity, VehicleCondition, VehicleType, Weather,
};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(
    name = "ontime",
    version,
    about = "Predict whether a delivery arrives on time and explain late predictions",
    long_about = "ontime loads a fitted delivery-performance pipeline and its label decoder,\n\
        collects one shipment at a time and predicts whether it arrives on time.\n\
        Late predictions are explained by the factor that influenced them most,\n\
        together with a recommended action.\n\n\
        EXAMPLES:\n\
        \n  ontime                                        Start the interactive form\n\
        \n  ontime predict --traffic Jam --distance 20    Predict one shipment\n\
        \n  ontime --json predict --record shipment.json  Predict from a JSON record\n\
        \n  ontime inspect                                Show features and classes"
)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding pipeline_model_binary.json and label_encoder.json
    #[arg(long = "artifacts-dir", value_name = "DIR", global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Pipeline artifact, overriding the artifacts directory
    #[arg(long, value_name = "FILE", global = true)]
    model: Option<PathBuf>,

    /// Label decoder artifact, overriding the artifacts directory
    #[arg(long, value_name = "FILE", global = true)]
    encoder: Option<PathBuf>,

    /// Class name that counts as on time
    #[arg(long = "on-time-label", value_name = "LABEL", global = true)]
    on_time_label: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive form (the default)
    #[command(
        about = "Fill in the shipment form interactively",
        long_about = "Starts a line-oriented form. Set fields with `field=value`,\n\
            review them with :show and run the prediction with :submit.\n\
            Other commands: :reset, :help, :quit."
    )]
    Form,
    /// Predict a single shipment
    Predict(PredictArgs),
    /// Show the loaded pipeline's output features and classes
    Inspect,
}

#[derive(Debug, Args, Clone, Default)]
struct PredictArgs {
    /// JSON shipment record keyed by column name ('-' reads stdin)
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,

    #[arg(long, conflicts_with = "record")]
    weather: Option<Weather>,
    #[arg(long, conflicts_with = "record")]
    vehicle: Option<VehicleType>,
    #[arg(long, conflicts_with = "record")]
    city: Option<CityType>,
    #[arg(long, conflicts_with = "record")]
    festival: Option<Festival>,
    #[arg(long, conflicts_with = "record")]
    traffic: Option<TrafficDensity>,
    /// Driver age, 20 to 40
    #[arg(long, conflicts_with = "record")]
    age: Option<DriverAge>,
    /// Driver rating, 1.0 to 5.0
    #[arg(long, conflicts_with = "record")]
    rating: Option<DriverRating>,
    /// Distance in km, 0.1 to 30.0
    #[arg(long, conflicts_with = "record")]
    distance: Option<DistanceKm>,
    /// Concurrent deliveries, 0 to 5
    #[arg(long, conflicts_with = "record")]
    deliveries: Option<ConcurrentDeliveries>,
    /// Vehicle condition, 0 to 2
    #[arg(long, conflicts_with = "record")]
    condition: Option<VehicleCondition>,
}

impl PredictArgs {
    /// Flags not given keep the form defaults
    fn to_record(&self) -> ShipmentRecord {
        let d = ShipmentRecord::default();
        ShipmentRecord {
            weather: self.weather.unwrap_or(d.weather),
            vehicle: self.vehicle.unwrap_or(d.vehicle),
            city: self.city.unwrap_or(d.city),
            festival: self.festival.unwrap_or(d.festival),
            traffic: self.traffic.unwrap_or(d.traffic),
            driver_age: self.age.unwrap_or(d.driver_age),
            driver_rating: self.rating.unwrap_or(d.driver_rating),
            distance_km: self.distance.unwrap_or(d.distance_km),
            deliveries: self.deliveries.unwrap_or(d.deliveries),
            vehicle_condition: self.condition.unwrap_or(d.vehicle_condition),
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    let _ = builder.try_init();
}

/// Loads the artifacts or prints the blocking startup message
fn load_context(settings: &Settings) -> Option<PredictionContext> {
    match PredictionContext::load(&settings.artifacts, settings.on_time_label.clone()) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_missing() {
                eprintln!(
                    "note: the model artifacts are required; expected '{}' and '{}'",
                    settings.artifacts.pipeline.display(),
                    settings.artifacts.label_encoder.display()
                );
            }
            eprintln!("note: nothing can be predicted until the artifacts load");
            None
        }
    }
}

fn run_form(ctx: &PredictionContext, mode: OutputMode) -> i32 {
    use rustyline::error::ReadlineError;
    use rustyline::Editor;
    let mut rl = match Editor::<(), rustyline::history::DefaultHistory>::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: failed to initialize the form: {e}");
            return 2;
        }
    };

    let mut session = FormSession::new();
    for line in FormSession::intro() {
        println!("{line}");
    }
    loop {
        match rl.readline(session.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                }
                match session.handle_line(&line) {
                    FormEvent::Output(out) => {
                        for l in out {
                            println!("{l}");
                        }
                    }
                    FormEvent::Submit(record) => match ctx.predict(&record) {
                        Ok(result) => println!("{}", render(&result, mode)),
                        Err(e) => println!("{}", render_error(&e, mode)),
                    },
                    FormEvent::Quit => return 0,
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return 0,
            Err(e) => {
                eprintln!("error: form failed: {e}");
                return 2;
            }
        }
    }
}

fn run_predict(ctx: &PredictionContext, args: &PredictArgs, mode: OutputMode) -> i32 {
    let record = match &args.record {
        Some(path) => match ontime::read_record(path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return 2;
            }
        },
        None => args.to_record(),
    };
    log::debug!("submitting {:?}", record);

    match ctx.predict(&record) {
        Ok(result) => {
            println!("{}", render(&result, mode));
            0
        }
        Err(e) => {
            let rendered = render_error(&e, mode);
            match mode {
                OutputMode::Json => println!("{rendered}"),
                OutputMode::Text => eprintln!("{rendered}"),
            }
            1
        }
    }
}

fn run_inspect(ctx: &PredictionContext, mode: OutputMode) -> i32 {
    match mode {
        OutputMode::Json => {
            let out = json!({
                "features": ctx.feature_names(),
                "classes": ctx.classes(),
                "on_time_label": ctx.on_time_label(),
            });
            println!("{out}");
        }
        OutputMode::Text => {
            println!("features ({}):", ctx.feature_names().len());
            for (i, name) in ctx.feature_names().iter().enumerate() {
                println!("  {i:>3}  {name}");
            }
            println!("classes: {}", ctx.classes().join(", "));
            println!("on-time label: {}", ctx.on_time_label());
        }
    }
    0
}

fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let settings = Settings::from_env(&Overrides {
        artifacts_dir: cli.artifacts_dir,
        model: cli.model,
        encoder: cli.encoder,
        on_time_label: cli.on_time_label,
    });

    // artifacts are loaded before any prompt is shown
    let Some(ctx) = load_context(&settings) else {
        return 2;
    };

    match cli.command.unwrap_or(Command::Form) {
        Command::Form => run_form(&ctx, mode),
        Command::Predict(args) => run_predict(&ctx, &args, mode),
        Command::Inspect => run_inspect(&ctx, mode),
    }
}

fn main() {
    std::process::exit(run_cli());
}
