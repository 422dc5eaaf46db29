use std::path::PathBuf;

use bounded_ring::{config::RingConfig, telemetry::initialize_subscriber, Consistent};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ring-inspect")]
#[command(about = "inspects how a bounded-load ring places partitions", long_about = None)]
struct Cli {
    #[arg(long)]
    config_path: PathBuf,
    #[arg(short, long, default_value = "false")]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints how many partitions each member owns
    Distribution,
    /// Prints the partition and owner of a key
    Locate {
        #[arg(short, long)]
        key: String,
    },
    /// Prints the members that should hold copies of a key, owner first
    Closest {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    initialize_subscriber(args.json_logs);

    let (config, members) = RingConfig::from_path(&args.config_path)?.into_parts();
    let ring = Consistent::new(members, config)?;

    match args.command {
        Commands::Distribution => {
            let mut loads: Vec<(String, usize)> = ring.load_distribution()?.into_iter().collect();
            loads.sort();
            println!(
                "partitions: {} average load: {}",
                ring.partition_count(),
                ring.average_load()?
            );
            for (member, load) in loads {
                println!("{}\t{}", member, load);
            }
        }
        Commands::Locate { key } => {
            let partition_id = ring.find_partition_id(key.as_bytes());
            match ring.get_partition_owner(partition_id)? {
                Some(owner) => println!("partition {} -> {}", partition_id, owner),
                None => println!("partition {} has no owner", partition_id),
            }
        }
        Commands::Closest { key, count } => {
            for member in ring.get_closest_n(key.as_bytes(), count)? {
                println!("{}", member);
            }
        }
    }

    Ok(())
}
