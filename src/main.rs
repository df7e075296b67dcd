use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use flowstore::config::{Config, TraceFormat};
use flowstore::counter::{CounterIntent, CounterReducer, CounterState};
use flowstore::logging::init_tracing;
use flowstore::mvi::{Intent, Reducer};
use flowstore::store::StoreBuilder;
use flowstore::trace::InspectorSink;

/// Drive the counter store from the command line.
#[derive(Debug, Parser)]
#[command(name = "flowstore", version, about)]
struct Cli {
    /// Config file (default: platform config dir/flowstore/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store name shown in trace output.
    #[arg(long)]
    name: Option<String>,

    /// Initial count.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    /// Trace output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Disable trace output.
    #[arg(long)]
    no_devtools: bool,

    /// Hide step content from the trace.
    #[arg(long)]
    untraced: bool,

    /// Steps to apply in order.
    #[arg(value_enum)]
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Step {
    #[value(alias = "inc")]
    Increment,
    #[value(alias = "dec")]
    Decrement,
}

impl Step {
    fn intent(self) -> CounterIntent {
        match self {
            Step::Increment => CounterIntent::Increment,
            Step::Decrement => CounterIntent::Decrement,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Console,
    Json,
}

impl From<FormatArg> for TraceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Console => TraceFormat::Console,
            FormatArg::Json => TraceFormat::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;
    apply_overrides(&mut config, &cli);

    let store = StoreBuilder::from_config(CounterState::new(cli.start), &config)
        .trace_sink(InspectorSink::new(config.devtools.clone()))
        .build();

    let _printer = store.subscribe(|state| println!("count = {}", state.count));

    for step in &cli.steps {
        match (step, cli.untraced) {
            (Step::Increment, false) => store.increment(),
            (Step::Decrement, false) => store.decrement(),
            (step, true) => {
                let intent = step.intent();
                store.dispatch_untraced(
                    move |state| CounterReducer::reduce(*state, intent),
                    intent.action(),
                );
            }
        }
    }

    println!("{}", serde_json::to_string(&store.get_state())?);
    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(name) = &cli.name {
        config.store.name = name.clone();
    }
    if let Some(format) = cli.format {
        config.devtools.format = format.into();
    }
    if cli.no_devtools {
        config.devtools.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_with_aliases() {
        let cli = Cli::parse_from(["flowstore", "inc", "decrement", "increment"]);
        assert_eq!(cli.steps.len(), 3);
        assert!(matches!(cli.steps[0], Step::Increment));
        assert!(matches!(cli.steps[1], Step::Decrement));
    }

    #[test]
    fn negative_start_is_accepted() {
        let cli = Cli::parse_from(["flowstore", "--start", "-3", "dec"]);
        assert_eq!(cli.start, -3);
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "flowstore",
            "--name",
            "demo",
            "--format",
            "json",
            "--no-devtools",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.store.name, "demo");
        assert_eq!(config.devtools.format, TraceFormat::Json);
        assert!(!config.devtools.enabled);
    }
}
