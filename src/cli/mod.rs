//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use colored::Colorize;

use crate::booking::{BookerApi, BookingRecord};
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::HttpClient;
use crate::testing::{self, StepStatus, TestResult};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Test {
            paths,
            verbose,
            base_url,
        } => {
            let config = Config::load()?.with_base_url(base_url);
            tracing::info!("Target: {}", config.target.base_url);

            let results = testing::run_suites(&paths, &config, verbose).await?;
            print_summary(&results);

            let failed = results.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::SuitesFailed {
                    failed,
                    total: results.len(),
                });
            }
            Ok(())
        }

        Commands::Ping { base_url } => {
            let api = api(base_url)?;
            api.ping().await?;
            println!("{} is up", api.client().base_url());
            Ok(())
        }

        Commands::List { base_url } => {
            let api = api(base_url)?;
            let bookings = api.list().await?;

            if bookings.is_empty() {
                println!("No bookings");
            } else {
                println!("{} bookings:", bookings.len());
                for booking in &bookings {
                    println!("  {}", booking.bookingid);
                }
            }
            Ok(())
        }

        Commands::Get { id, base_url } => {
            let api = api(base_url)?;
            match api.get(id).await? {
                Some(record) => print_booking(id, &record),
                None => println!("Booking {} not found", id),
            }
            Ok(())
        }
    }
}

fn api(base_url: Option<String>) -> Result<BookerApi> {
    let config = Config::load()?.with_base_url(base_url);
    Ok(BookerApi::new(HttpClient::from_config(&config)?))
}

fn print_booking(id: u64, record: &BookingRecord) {
    println!("Booking {}", id);
    println!("  Guest:    {} {}", record.firstname, record.lastname);
    println!("  Price:    {}", record.totalprice);
    println!("  Deposit:  {}", if record.depositpaid { "paid" } else { "not paid" });
    println!(
        "  Dates:    {} -> {}",
        record.bookingdates.checkin, record.bookingdates.checkout
    );
    if let Some(needs) = &record.additionalneeds {
        println!("  Needs:    {}", needs);
    }
}

fn print_summary(results: &[TestResult]) {
    println!("{}", "Summary:".cyan().bold());
    for result in results {
        if result.passed {
            println!(
                "  {} {} ({}/{} steps)",
                "✓".green(),
                result.name,
                result.passed_count(),
                result.steps_total
            );
            continue;
        }

        println!(
            "  {} {} ({}/{} steps)",
            "✗".red(),
            result.name,
            result.passed_count(),
            result.steps_total
        );
        if let Some(error) = &result.error {
            println!("      {}", error);
        }
        for step in result.failed_steps() {
            if let StepStatus::Failed(e) = &step.status {
                println!("      {}: {}", step.name, e);
            }
        }
    }

    let passed = results.iter().filter(|r| r.passed).count();
    println!("\n{} of {} suites passed", passed, results.len());
}
