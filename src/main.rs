use futures::StreamExt;
use log::error;
use nutrition_scrape::{server, ContentType, NutritionScraper, ScraperConfig};
use std::env;

const USAGE: &str = "Usage:
  nutrition-scrape [serve]
  nutrition-scrape details <slug> [potravina|recept]
  nutrition-scrape search <query>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ScraperConfig::load()?;
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => server::serve(config).await?,
        Some("details") => {
            let slug = args.get(1).ok_or(USAGE)?;
            let food_type = args.get(2).and_then(|value| ContentType::from_wire(value));
            let scraper = NutritionScraper::from_config(config)?;
            let details = scraper.details(slug, food_type).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Some("search") => {
            let query = args[1..].join(" ");
            if query.trim().is_empty() {
                return Err(USAGE.into());
            }
            let scraper = NutritionScraper::from_config(config)?;
            let mut events = Box::pin(scraper.search(&query));
            while let Some(event) = events.next().await {
                print!("{}", event.to_line());
            }
        }
        Some(other) => {
            error!("Unknown command '{}'", other);
            return Err(USAGE.into());
        }
    }

    Ok(())
}
