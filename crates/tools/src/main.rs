use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formats::regions_to_feature_collection;
use layers::{ChoroplethLayer, ExtrusionStyle, Scales};
use tools::{
    ToolError, domain_line, fetch_dataset, resolve_config, scenario_index, scenario_lines,
    simulate_play, write_styles,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect an extruded demand map offline")]
struct Args {
    /// Map configuration JSON (defaults apply to anything it omits)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Boundary dataset: file path or http(s) URL (TopoJSON or GeoJSON)
    #[arg(long, global = true)]
    boundaries: Option<String>,

    /// Demand table: file path or http(s) URL (CSV)
    #[arg(long, global = true)]
    table: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join boundaries to the demand table and print the join report
    Join {
        /// Write the joined regions as GeoJSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List scenarios with the non-zero extent of each
    Scenarios,

    /// Print the value domain shared by every scenario
    Domain,

    /// Per-region elevation and fill for one scenario, as CSV
    Styles {
        #[arg(long)]
        scenario: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Simulate auto-advance and print the scenario sequence
    Play {
        #[arg(long, default_value_t = 10)]
        steps: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = resolve_config(args.config.as_deref(), args.boundaries, args.table)?;

    let client = reqwest::Client::new();
    let loaded = fetch_dataset(&client, &config.source).await?;
    let set = &loaded.regions;

    let layer = ChoroplethLayer::new(1, ExtrusionStyle::from(&config.style));
    let scales: Scales = layer.scales(set);

    match args.command {
        Command::Join { out } => {
            let r = loaded.report;
            println!("regions\t{}", set.len());
            println!("scenarios\t{}", set.scenarios().len());
            println!("matched\t{}", r.matched);
            println!("unmatched\t{}", r.unmatched);
            println!("skipped\t{}", r.skipped);
            println!("unused_rows\t{}", r.unused_rows);
            println!("bad_cells\t{}", r.bad_cells);
            if let Some(path) = out {
                let fc = regions_to_feature_collection(set, &config.source.name_property);
                let payload = fc.to_geojson_string_pretty().map_err(ToolError::from)?;
                fs::write(&path, payload).map_err(|source| ToolError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!("wrote {}", path.display());
            }
        }
        Command::Scenarios => {
            for line in scenario_lines(set) {
                println!("{line}");
            }
        }
        Command::Domain => println!("{}", domain_line(&scales)),
        Command::Styles { scenario, out } => {
            let index = scenario_index(set, &scenario)?;
            match out {
                Some(path) => {
                    let file = fs::File::create(&path).map_err(|source| ToolError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    write_styles(file, set, &layer, &scales, index)?;
                    info!("wrote {}", path.display());
                }
                None => write_styles(io::stdout().lock(), set, &layer, &scales, index)?,
            }
        }
        Command::Play { steps } => {
            let mut stdout = io::stdout().lock();
            for step in simulate_play(set, &config.playback, steps) {
                writeln!(stdout, "{:>8.1}s\t{}\t{}", step.at_s, step.index, step.scenario)?;
            }
        }
    }

    Ok(())
}
