mod logger;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use midiflux::{midi::MidiEventKind, streams::InputBridge};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    opts: CommonOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonOptions {
    /// Log verbosity level
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Write logs to this file
    #[arg(long)]
    log: Option<std::path::PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available MIDI sources
    Sources,
    /// Subscribe to a source and print its note events
    Monitor(MonitorOptions),
}

#[derive(Args, Debug)]
struct MonitorOptions {
    /// Unique id of the source to monitor, see `midiflux sources`
    #[arg(long)]
    source_id: i32,

    /// Name the input port instead of using a generated one
    #[arg(long)]
    port_name: Option<String>,

    /// Only show events on this channel (0-15)
    #[arg(long)]
    channel: Option<u8>,

    /// Only show events of this kind
    #[arg(long, value_enum)]
    kind: Option<EventKindArg>,

    /// Print note names instead of full events
    #[arg(long, default_value_t = false)]
    notes: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum EventKindArg {
    On,
    Off,
}

impl From<EventKindArg> for MidiEventKind {
    fn from(kind: EventKindArg) -> Self {
        match kind {
            EventKindArg::On => MidiEventKind::NoteOn,
            EventKindArg::Off => MidiEventKind::NoteOff,
        }
    }
}

fn main() {
    let args = Cli::parse();

    if let Some(file) = &args.opts.log {
        if let Err(e) = logger::start("midiflux", file, args.opts.verbose) {
            eprintln!("{} {}", "Error:".red().bold(), format!("{e}").bold());
            std::process::exit(1);
        }
    }

    let result = match args.command {
        Commands::Sources => list_sources(),
        Commands::Monitor(opts) => monitor(opts),
    };

    if let Err(e) = result {
        if logger::is_active() {
            log::error!("{e}");
        }
        eprintln!("{} {}", "Error:".red().bold(), format!("{e}").bold());
        std::process::exit(1);
    }
}

fn list_sources() -> anyhow::Result<()> {
    let bridge = InputBridge::with_default_driver()?;
    let sources = bridge.sources();

    if sources.is_empty() {
        println!("no MIDI sources available");
        return Ok(());
    }

    for source in sources {
        println!("{:>11}  {}", source.unique_id, source.display_name);
    }

    Ok(())
}

fn monitor(opts: MonitorOptions) -> anyhow::Result<()> {
    let bridge = InputBridge::with_default_driver()?;
    let mut events = bridge
        .open_stream(opts.source_id, opts.port_name.as_deref())
        .subscribe()?;

    if let Some(channel) = opts.channel {
        events = events.by_channel(channel);
    }

    if let Some(kind) = opts.kind {
        events = events.by_type(kind.into());
    }

    if opts.notes {
        for note in events.to_note_names().iter() {
            println!("{note}");
        }
        return Ok(());
    }

    for event in events.iter() {
        let kind = match event.data.kind {
            MidiEventKind::NoteOn => "on ".green(),
            MidiEventKind::NoteOff => "off".yellow(),
        };

        println!(
            "{kind} ch {:>2} {:<4} vel {:>3}",
            event.data.channel,
            event.data.note_name(),
            event.data.velocity,
        );
    }

    Ok(())
}
