//! Console Bot Example
//!
//! Reads commands from stdin and prints replies:
//!
//! ```text
//! $math add 1 2          3
//! $m sum 1.5, 2, 3       6.5
//! $ping                  pong
//! $echo "hello there"    hello there
//! $greet                 Hello, <your user name>!
//! $timer 1m30s           Timer set for 90s
//! $paint dark red        Painting it DARK_RED
//! roll 2d6               Rolling 2 dice with 6 sides
//! $help                  every public module
//! $help math             the commands of math
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --prefix '!' --disable paint
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commandler::prelude::*;
use commandler::runtime::ConfigLoader;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Type commands, get replies")]
struct Cli {
    /// Configuration file; defaults to commandler.toml in the working directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command prefix, replacing the configured ones.
    #[arg(short, long)]
    prefix: Option<String>,

    /// Controller to disable; may be repeated.
    #[arg(long = "disable", value_name = "CONTROLLER")]
    disabled: Vec<String>,

    /// Keep every invoked action in memory.
    #[arg(long)]
    cache: bool,
}

const COLOR: TypeKey = TypeKey::enumeration("color");

// ============================================================================
// Controllers
// ============================================================================

fn math() -> (ControllerBuilder, CommandRouter) {
    let metadata = Controller::builder("math")
        .name("Math")
        .group("Tools")
        .description("Arithmetic on numbers")
        .alias("math")
        .alias("m")
        .command(
            Command::builder("add")
                .alias("add")
                .alias("+")
                .description("Adds two integers")
                .param(Parameter::new("a", ParamType::Scalar(TypeKey::I32)))
                .param(Parameter::new("b", ParamType::Scalar(TypeKey::I32))),
        )
        .command(
            Command::builder("sum")
                .alias("sum")
                .description("Adds a list of numbers")
                .param(Parameter::new("numbers", ParamType::Array(TypeKey::F64))),
        );

    let handler = CommandRouter::new()
        .on(
            "add",
            handler_fn(|inv: Invocation| async move {
                let a: i32 = inv.arg(0).unwrap_or_default();
                let b: i32 = inv.arg(1).unwrap_or_default();
                a.checked_add(b)
                    .map(|sum| sum.to_string())
                    .ok_or("the sum does not fit in 32 bits")
            }),
        )
        .on(
            "sum",
            handler_fn(|inv: Invocation| async move {
                let numbers: Vec<f64> = inv.arg(0).unwrap_or_default();
                numbers.iter().sum::<f64>().to_string()
            }),
        );
    (metadata, handler)
}

fn ping() -> ControllerBuilder {
    Controller::builder("ping")
        .name("Ping")
        .description("Checks that the bot is alive")
        .alias("ping")
        .command(Command::builder("pong").default_command())
}

fn util() -> ControllerBuilder {
    Controller::builder("util")
        .name("Utilities")
        .group("Tools")
        .alias("util")
        .command(
            Command::builder("echo")
                .alias("echo")
                .static_command()
                .description("Repeats the text; quote it to keep spaces")
                .param(Parameter::new("text", ParamType::Scalar(TypeKey::STRING))),
        )
}

fn greet() -> ControllerBuilder {
    Controller::builder("greet")
        .name("Greeter")
        .alias("greet")
        .alias("hi")
        .command(
            Command::builder("hello").default_command().param(
                Parameter::new("name", ParamType::Scalar(TypeKey::STRING))
                    .default_value("${source.user}")
                    .description("Who to greet; defaults to you"),
            ),
        )
}

fn timer() -> ControllerBuilder {
    Controller::builder("timer")
        .name("Timer")
        .group("Tools")
        .alias("timer")
        .command(
            Command::builder("set")
                .default_command()
                .description("Prints a message after the given duration, e.g. 1m30s")
                .param(Parameter::new("duration", ParamType::Scalar(TypeKey::DURATION))),
        )
}

fn paint() -> (ControllerBuilder, EnumAdapter) {
    let metadata = Controller::builder("paint")
        .name("Paint")
        .alias("paint")
        .command(
            Command::builder("with")
                .default_command()
                .param(Parameter::new("color", ParamType::Scalar(COLOR))),
        );
    let colors = EnumAdapter::new().with(
        COLOR,
        [
            EnumVariant::new("RED"),
            EnumVariant::new("DARK_RED").value("maroon"),
            EnumVariant::new("BLUE"),
        ],
    );
    (metadata, colors)
}

fn dice() -> ControllerBuilder {
    Controller::builder("dice")
        .name("Dice")
        .hidden()
        .command(
            Command::builder("roll")
                .property(Property::new(PATTERN, r"(?i)^roll (\d+)d(\d+)$"))
                .param(Parameter::new("count", ParamType::Scalar(TypeKey::I32)))
                .param(Parameter::new("sides", ParamType::Scalar(TypeKey::I32))),
        )
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_current_dir();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if let Some(prefix) = cli.prefix {
        config.standard_dispatcher.prefixes = vec![prefix];
    }
    config.disabled.extend(cli.disabled);
    config.cache.enabled |= cli.cache;

    let (math, math_handler) = math();
    let (paint, colors) = paint();

    let commandler = Commandler::builder()
        .config(config)
        .controller(math, math_handler)
        .controller(
            ping(),
            handler_fn(|_: Invocation| async { "pong" }),
        )
        .controller(
            util(),
            CommandRouter::new().on(
                "echo",
                handler_fn(|inv: Invocation| async move { inv.arg::<String>(0) }),
            ),
        )
        .controller(
            greet(),
            handler_fn(|inv: Invocation| async move {
                let name: String = inv.arg(0).unwrap_or_default();
                format!("Hello, {name}!")
            }),
        )
        .controller(
            timer(),
            handler_fn(|inv: Invocation| async move {
                let duration: Duration = inv.arg(0).unwrap_or_default();
                tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    println!("Timer of {duration:?} is done");
                });
                format!("Timer set for {duration:?}")
            }),
        )
        .adapter(&colors.types(), colors)
        .controller(
            paint,
            handler_fn(|inv: Invocation| async move {
                let color = inv.args().value(0).and_then(Value::as_enum).unwrap_or("nothing");
                format!("Painting it {color}")
            }),
        )
        .controller(
            dice(),
            handler_fn(|inv: Invocation| async move {
                let count: i32 = inv.arg(0).unwrap_or_default();
                let sides: i32 = inv.arg(1).unwrap_or_default();
                format!("Rolling {count} dice with {sides} sides")
            }),
        )
        .build()?;

    info!(
        controllers = commandler.registry().len(),
        prefixes = ?commandler.config().standard_dispatcher.prefixes,
        "Console bot ready"
    );

    commandler.run(ConsoleIntegration::new()).await?;

    if let Some(cache) = commandler.cache() {
        info!(actions = cache.len(), "Cached actions");
    }
    Ok(())
}
