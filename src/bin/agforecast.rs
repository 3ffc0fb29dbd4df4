use agforecast::{AgForecast, BoundingBox, LatLon, PointOutcome, WisconetClient};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde_json::json;

#[derive(Parser)]
#[command(name = "agforecast")]
#[command(about = "Daily crop disease risk from hourly weather history", long_about = None)]
struct Cli {
    /// Timezone used to bucket hours into days
    #[arg(long, global = true, default_value = "US/Central", value_parser = parse_timezone)]
    timezone: Tz,

    /// Days of hourly history fetched before the end date
    #[arg(long, global = true, default_value_t = agforecast::DEFAULT_LOOKBACK_DAYS)]
    lookback_days: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Risk for a single point
    Point {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Last forecasting date, defaults to today (UTC)
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
    /// Risk for every point of a lattice over a bounding box
    Grid {
        #[arg(long, allow_hyphen_values = true)]
        min_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        min_lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        max_lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        max_lon: f64,
        /// Lattice spacing in degrees
        #[arg(long, default_value_t = 0.1)]
        resolution: f64,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Points fetched at once, one after another unless raised
        #[arg(long, env = "AGFORECAST_CONCURRENCY", default_value_t = 1)]
        concurrency: usize,
    },
    /// List Wisconet stations
    Stations {
        #[arg(long, default_value_t = 0)]
        min_days_active: i64,
    },
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    agforecast::parse_timezone(name).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Point { lat, lon, end_date } => {
            let client = AgForecast::from_env()?
                .with_timezone(cli.timezone)
                .with_lookback_days(cli.lookback_days);
            let outcome = client
                .point_risk()
                .location(LatLon(lat, lon))
                .end_date(end_date.unwrap_or_else(|| Utc::now().date_naive()))
                .call()
                .await;
            match outcome {
                PointOutcome::Risk(weather) => println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &json!({ "location": weather.location, "records": weather.risks })
                    )?
                ),
                PointOutcome::NoData => {
                    println!("{}", json!({ "location": [lat, lon], "records": [] }))
                }
                PointOutcome::Failed(e) => return Err(e.into()),
            }
        }
        Command::Grid {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
            resolution,
            end_date,
            concurrency,
        } => {
            let client = AgForecast::from_env()?
                .with_timezone(cli.timezone)
                .with_lookback_days(cli.lookback_days);
            let result = client
                .grid_risk()
                .bbox(BoundingBox::new(min_lat, min_lon, max_lat, max_lon)?)
                .resolution(resolution)
                .end_date(end_date.unwrap_or_else(|| Utc::now().date_naive()))
                .concurrency(concurrency)
                .call()
                .await?;
            println!("{}", result.to_json()?);
        }
        Command::Stations { min_days_active } => {
            let stations = WisconetClient::new()?
                .all_stations()
                .min_days_active(min_days_active)
                .call()
                .await?;
            println!("{}", serde_json::to_string_pretty(&stations)?);
        }
    }

    Ok(())
}
