//! Runtime settings read from the environment (and `.env` via dotenvy in `main`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub client_url: String,
    pub product_csv: PathBuf,
    pub discount_csv: PathBuf,
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub currency: String,
    pub tax_rate: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            client_url: "http://localhost:3000".to_string(),
            product_csv: PathBuf::from("src/assets/product_list.csv"),
            discount_csv: PathBuf::from("src/assets/discount_codes.csv"),
            stripe_secret_key: None,
            stripe_api_base: "https://api.stripe.com/v1".to_string(),
            currency: "usd".to_string(),
            tax_rate: Decimal::new(825, 4),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parsed("PORT")?.unwrap_or(defaults.port),
            client_url: var("CLIENT_URL").unwrap_or(defaults.client_url).trim_end_matches('/').to_string(),
            product_csv: var("PRODUCT_CSV_PATH").map(PathBuf::from).unwrap_or(defaults.product_csv),
            discount_csv: var("DISCOUNT_CSV_PATH").map(PathBuf::from).unwrap_or(defaults.discount_csv),
            stripe_secret_key: var("STRIPE_SECRET_KEY"),
            stripe_api_base: var("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base).trim_end_matches('/').to_string(),
            currency: var("CHECKOUT_CURRENCY").unwrap_or(defaults.currency).to_lowercase(),
            tax_rate: parsed("TAX_RATE")?.unwrap_or(defaults.tax_rate),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")))
        .transpose()
}
