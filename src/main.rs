use anyhow::Result;
use clap::Parser;

use genohive::logging::init_logger;
use genohive::{HiveOptions, ParquetWriteOptions};

mod commands;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose);

    match args.command {
        Commands::Hive {
            input,
            output,
            group_size,
            threads,
            bucket_count,
            compression,
        } => {
            let options = HiveOptions {
                group_size,
                threads,
                bucket_count,
                write: ParquetWriteOptions {
                    compression,
                    ..Default::default()
                },
            };
            commands::hive::partition_files(&input, &output, &options)
        }
        Commands::HiveConfig { config } => commands::hive::partition_from_config(&config),
        Commands::Buckets { hive } => commands::hive::print_buckets(&hive),
        Commands::Lookup {
            hive,
            id,
            bucket_count,
        } => commands::hive::lookup(&hive, id, bucket_count),
    }
}
