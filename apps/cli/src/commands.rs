//! Command handlers. Each returns the JSON value to print.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{json, Value};

use locus_address::{
    describe_outcome, AddressEngine, EngineConfig, OutcomeDescription, ProviderHealthSnapshot,
    ValidationRequest, ValidationResult,
};

use crate::cli::{Command, GeocodeArgs, ReverseArgs, SearchArgs, ValidateArgs, ZipArgs};

pub async fn run(command: &Command, config: &EngineConfig) -> Result<Value> {
    let engine = AddressEngine::from_config(config).context("failed to build address engine")?;

    match command {
        Command::Search(args) => search(&engine, args).await,
        Command::Geocode(args) => geocode(&engine, args).await,
        Command::Reverse(args) => reverse(&engine, args).await,
        Command::Validate(args) => validate(&engine, args).await,
        Command::Zip(args) => zip(&engine, args).await,
        Command::Status => status(&engine, config),
    }
}

async fn search(engine: &AddressEngine, args: &SearchArgs) -> Result<Value> {
    if args.limit == 0 {
        bail!("--limit must be greater than zero");
    }

    let results = engine.search_addresses(&args.query, args.limit).await?;
    Ok(json!({ "query": args.query.trim(), "results": results }))
}

async fn geocode(engine: &AddressEngine, args: &GeocodeArgs) -> Result<Value> {
    let address = args.address.join(" ");
    let result = engine.geocode_address(&address).await?;
    Ok(json!({ "query": address, "result": result }))
}

async fn reverse(engine: &AddressEngine, args: &ReverseArgs) -> Result<Value> {
    if !locus_address::is_valid_coordinate(args.latitude, args.longitude) {
        bail!(
            "({}, {}) is not a valid latitude/longitude pair",
            args.latitude,
            args.longitude
        );
    }

    let result = engine.reverse_geocode(args.latitude, args.longitude).await?;
    Ok(json!({ "result": result }))
}

#[derive(Serialize)]
struct ValidationOutput {
    result: ValidationResult,
    outcome: OutcomeDescription,
}

async fn validate(engine: &AddressEngine, args: &ValidateArgs) -> Result<Value> {
    let mut request = ValidationRequest::new(&args.street, &args.city, &args.state, &args.zip);
    if let Some(secondary) = &args.secondary {
        request = request.with_secondary(secondary);
    }

    let result = engine.validate_address(&request).await?;
    let outcome = describe_outcome(&result);
    Ok(serde_json::to_value(ValidationOutput { result, outcome })?)
}

async fn zip(engine: &AddressEngine, args: &ZipArgs) -> Result<Value> {
    let found = engine.lookup_zip_code(&args.zip).await?;
    Ok(json!({ "zip": args.zip.trim(), "result": found }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput<'a> {
    primary_url: &'a str,
    secondary_enabled: bool,
    usps_configured: bool,
    country_code: &'a str,
    request_timeout_ms: u128,
    deadline_ms: Option<u128>,
    providers: Vec<ProviderHealthSnapshot>,
}

fn status(engine: &AddressEngine, config: &EngineConfig) -> Result<Value> {
    let output = StatusOutput {
        primary_url: &config.nominatim_url,
        secondary_enabled: config.is_secondary_enabled(),
        usps_configured: engine.is_usps_configured(),
        country_code: &config.country_code,
        request_timeout_ms: config.request_timeout.as_millis(),
        deadline_ms: config.deadline.map(|d| d.as_millis()),
        providers: engine.provider_health(),
    };
    Ok(serde_json::to_value(output)?)
}
