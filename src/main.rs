//! Keeps a weighted list of restaurants and picks one for lunch
use clap::{Parser, Subcommand};
use lunch_gotcha::picker::Candidate;
use lunch_gotcha::transfer::{export_to, import_from, EXPORT_FILE_NAME};
use lunch_gotcha::{FileStore, RestaurantList, RestaurantUpdate, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the restaurant list is stored in
    #[arg(
        short,
        long,
        env = "LUNCH_GOTCHA_DIR",
        default_value = ".lunch-gotcha",
        global = true
    )]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show every restaurant
    List,
    /// Add a restaurant, enabled
    Add {
        name: String,
        #[arg(short, long, default_value_t = 1.0)]
        weight: f64,
    },
    /// Remove a restaurant by id
    Remove {
        id: u64,
    },
    /// Change the name, weight or enabled flag of a restaurant
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Let a restaurant be picked again
    Enable {
        id: u64,
    },
    /// Keep a restaurant on the list without picking it
    Disable {
        id: u64,
    },
    /// Pick one of the enabled restaurants, biased by weight
    Pick,
    /// Write the list to a JSON file
    Export {
        #[arg(default_value = EXPORT_FILE_NAME)]
        path: PathBuf,
    },
    /// Replace the list with the contents of a JSON file
    Import {
        path: PathBuf,
    },
}

fn not_found(id: u64) -> ExitCode {
    eprintln!("No restaurant with id {}", id);
    ExitCode::FAILURE
}

fn set_enabled(list: &mut RestaurantList<FileStore>, id: u64, enabled: bool) -> Result<ExitCode> {
    if !list.set_enabled(id, enabled)? {
        return Ok(not_found(id));
    }
    println!("{} {}", if enabled { "Enabled" } else { "Disabled" }, id);
    Ok(ExitCode::SUCCESS)
}

fn run(command: Command, list: &mut RestaurantList<FileStore>) -> Result<ExitCode> {
    match command {
        Command::List => {
            println!("Id\tWeight\tEnabled\tName");
            for restaurant in list.restaurants() {
                println!(
                    "{}\t{}\t{}\t{}",
                    restaurant.id,
                    restaurant.weight,
                    if restaurant.enabled { "yes" } else { "no" },
                    restaurant.name
                );
            }
        }
        Command::Add { name, weight } => {
            let restaurant = list.add(name, weight)?;
            println!("Added {} ({})", restaurant.name, restaurant.id);
        }
        Command::Remove { id } => {
            if !list.remove(id)? {
                return Ok(not_found(id));
            }
            println!("Removed {}", id);
        }
        Command::Update {
            id,
            name,
            weight,
            enabled,
        } => {
            let update = RestaurantUpdate {
                name,
                weight,
                enabled,
            };
            if update.is_empty() {
                eprintln!("Nothing to update; pass --name, --weight or --enabled");
                return Ok(ExitCode::FAILURE);
            }
            if !list.update(id, update)? {
                return Ok(not_found(id));
            }
            println!("Updated {}", id);
        }
        Command::Enable { id } => return set_enabled(list, id, true),
        Command::Disable { id } => return set_enabled(list, id, false),
        Command::Pick => match list.pick() {
            Some(restaurant) => {
                println!("{}", restaurant.name);
                log::debug!(
                    "Weight {} of {} enabled",
                    restaurant.weight(),
                    list.enabled().len()
                );
            }
            None => {
                eprintln!("No enabled restaurants to pick from");
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Export { path } => {
            let written = export_to(list, &path)?;
            println!("Exported {} restaurants to {}", list.len(), written.display());
        }
        Command::Import { path } => {
            let count = import_from(list, &path)?;
            println!("Imported {} restaurants", count);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let mut list = RestaurantList::load(FileStore::new(&args.data_dir));
    match run(args.command, &mut list) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
