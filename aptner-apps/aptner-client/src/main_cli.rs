//!  Aptner Client
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//!
//! # Examples
//!
//! Credentials come from flags or the environment:
//!
//! ```bash
//! export APTNER_ID=resident APTNER_PASSWORD=...
//! ```
//!
//! ## Check credentials
//!
//! ```bash
//! aptner login
//! ```
//!
//! ## This month's management fee
//!
//! ```bash
//! aptner fee
//! ```
//!
//! ## Where are my cars
//!
//! ```bash
//! aptner car-status -p 12가3456
//! aptner track --cars "12가3456, 34나5678"
//! ```
//!
//! ## Visitor parking
//!
//! ```bash
//! aptner reservations
//! aptner reserve --date 2026.03.01 --purpose "가족 방문" --plate 56다7890 --days 2 --phone 010-0000-0000
//! ```
//!
//! # Output
//!
//! Results are printed as pretty JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use aptner_client::{
    AptnerClient, ClientConfig, Credentials, DEFAULT_BASE_URL, ReservationRequest,
    parse_car_list, parse_visit_date,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "aptner")]
#[command(version = "0.1.0")]
#[command(about = "Fees, parking history and visitor reservations from Aptner")]
struct Args {
    /// Aptner account id
    #[arg(long, env = "APTNER_ID")]
    id: String,

    /// Aptner account password
    #[arg(long, env = "APTNER_PASSWORD", hide_env_values = true)]
    password: String,

    /// API base URL
    #[arg(long, env = "APTNER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate credentials
    Login,

    /// Current management fee with line items
    Fee,

    /// Entry/exit records, first record per vehicle
    FindCar {
        #[arg(short, long)]
        plate: Option<String>,
    },

    /// Latest in/out state per vehicle
    CarStatus {
        #[arg(short, long)]
        plate: Option<String>,
    },

    /// Latest state of a list of cars (comma or newline separated)
    Track {
        #[arg(short, long)]
        cars: String,
    },

    /// Upcoming visitor reservations as date ranges per vehicle
    Reservations,

    /// Reserve visitor parking
    Reserve {
        /// Visit date (YYYY.MM.DD, YYYY-MM-DD or YYYY/MM/DD)
        #[arg(short, long)]
        date: String,
        #[arg(long)]
        purpose: String,
        #[arg(short, long)]
        plate: String,
        #[arg(long, default_value = "1")]
        days: u32,
        #[arg(long)]
        phone: String,
    },
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.to_string().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", out);
    Ok(())
}

async fn run(client: &AptnerClient, command: Command) -> Result<()> {
    client.authenticate().await.context("Login failed")?;

    match command {
        Command::Login => print_json(&json!({ "authenticated": true })),
        Command::Fee => {
            let fee = client.get_fee().await.context("Fee lookup failed")?;
            print_json(&fee)
        }
        Command::FindCar { plate } => {
            let records = client
                .find_car(plate.as_deref())
                .await
                .context("Car lookup failed")?;
            print_json(&records)
        }
        Command::CarStatus { plate } => {
            let records = client
                .get_car_status(plate.as_deref())
                .await
                .context("Car status lookup failed")?;
            print_json(&records)
        }
        Command::Track { cars } => {
            let plates = parse_car_list(&cars);
            anyhow::ensure!(!plates.is_empty(), "No car numbers given");
            let records = client
                .get_tracked_car_status(&plates)
                .await
                .context("Car status lookup failed")?;
            print_json(&records)
        }
        Command::Reservations => {
            let ranges = client
                .get_reserve_status()
                .await
                .context("Reservation listing failed")?;
            print_json(&ranges)
        }
        Command::Reserve {
            date,
            purpose,
            plate,
            days,
            phone,
        } => {
            let request = ReservationRequest {
                visit_date: parse_visit_date(&date)?,
                purpose,
                car_no: plate,
                days,
                phone,
            };
            client
                .reserve_car(&request)
                .await
                .context("Reservation failed")?;
            print_json(&json!({
                "reserved": true,
                "carNo": request.car_no,
                "visitDate": request.visit_date,
                "days": request.days,
            }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    tracing::debug!("Parsed args for command: {:?}", args.command);

    let credentials = Credentials::new(&args.id, &args.password).context("Invalid credentials")?;
    let config = ClientConfig::builder()
        .base_url(&args.base_url)
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("Invalid client configuration")?;
    let client = AptnerClient::new(credentials, &config).context("Failed to create Aptner client")?;

    if let Err(e) = run(&client, args.command).await {
        eprintln!("aptner: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
