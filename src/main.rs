use anyhow::Context;
use clap::Parser;
use std::io;
use student_records::cli::{Cli, Command};
use student_records::menu::{self, Menu};
use student_records::settings::Settings;
use student_records::web;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let mut manager = student_records::create_default_manager(&settings, cli.database.as_deref())?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            Menu::new(&mut manager, io::stdin().lock(), io::stdout().lock()).run()?;
        }
        Command::Serve { address } => {
            let address = address.unwrap_or(settings.web.address);
            println!("Serving student records on http://{address}");
            web::serve(&mut manager, &address)?;
        }
        Command::Seed => {
            manager.seed()?;
            println!("Example data seeded.");
        }
        Command::Demo => menu::run_demo(&mut manager, io::stdout().lock())?,
    }

    Ok(())
}
