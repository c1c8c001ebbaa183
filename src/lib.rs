//! Delivery zone evaluation for a single-hub food business.
//!
//! Given a customer coordinate (usually from a UK postcode) the evaluator
//! decides whether the address is in the delivery area, which zone applies
//! and what it costs. Zones come either from live driving time to the hub
//! or from precomputed polygons.

extern crate chrono;
extern crate config as config_crate;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate geo;
extern crate hyper;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate tokio_core;

pub mod config;
pub mod errors;
pub mod geometry;
pub mod http;
pub mod microservice;
pub mod models;
pub mod services;

use std::sync::Arc;

use failure::{Error as FailureError, Fail};
use serde::ser::Serialize;
use tokio_core::reactor::{Core, Handle};

pub use config::{Config, Strategy};
use errors::Error;
use http::HyperHttpClient;
use microservice::{OpenRouteServiceOracle, PostcodesIoGeocoder};
use services::{load_zone_file, DeliveryCheckService, DeliveryZoneEvaluator, InMemoryZoneStore};

/// One invocation of the runner.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Check(String),
    Quote(String, f64),
    Distance(String, String),
    Zones,
    Status,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, FailureError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_str()).collect();
        match args.as_slice() {
            ["check", postcode] => Ok(Command::Check(postcode.to_string())),
            ["quote", postcode, subtotal] => {
                let subtotal = subtotal
                    .parse::<f64>()
                    .map_err(|e| FailureError::from(e.context(format!("Subtotal {:?} is not a number", subtotal)).context(Error::InvalidOrder)))?;
                Ok(Command::Quote(postcode.to_string(), subtotal))
            }
            ["distance", from, to] => Ok(Command::Distance(from.to_string(), to.to_string())),
            ["zones"] => Ok(Command::Zones),
            ["status"] => Ok(Command::Status),
            _ => Err(format_err!(
                "Usage: check <postcode> | quote <postcode> <subtotal> | distance <postcode> <postcode> | zones | status"
            )),
        }
    }
}

/// Builds the evaluator for the configured strategy. Every setting is
/// checked here so a bad deployment fails before serving anything.
pub fn build_evaluator(config: &Config, handle: &Handle) -> Result<DeliveryZoneEvaluator, FailureError> {
    let hub = config.hub()?;
    let settings = config.delivery_settings()?;

    match config.strategy()? {
        Strategy::TravelTime => {
            let api_key = config.oracle_api_key()?;
            let http_client = HyperHttpClient::new(handle, config.oracle_timeout()?);
            let oracle = OpenRouteServiceOracle::new(
                Box::new(http_client),
                config.oracle_url.clone(),
                api_key,
                config.oracle_profile.clone(),
            );
            info!("Evaluating delivery by driving time from hub {:?}", hub.location.x_y());
            Ok(DeliveryZoneEvaluator::travel_time(hub, settings, Arc::new(oracle)))
        }
        Strategy::Polygon => {
            let store = InMemoryZoneStore::new();
            match config.zones_file {
                Some(ref path) => {
                    store.replace(load_zone_file(path)?)?;
                }
                None => warn!("Polygon strategy selected without zones_file, every check will report zones not configured"),
            }
            info!("Evaluating delivery by zone polygons around hub {:?}", hub.location.x_y());
            Ok(DeliveryZoneEvaluator::polygon(hub, settings, Arc::new(store)))
        }
    }
}

pub fn build_check_service(config: &Config, handle: &Handle) -> Result<DeliveryCheckService, FailureError> {
    let evaluator = build_evaluator(config, handle)?;
    let http_client = HyperHttpClient::new(handle, config.geocoder_timeout()?);
    let geocoder = PostcodesIoGeocoder::new(Box::new(http_client), config.geocoder_url.clone());
    Ok(DeliveryCheckService::new(Arc::new(geocoder), Arc::new(evaluator)))
}

/// Runs one command on a fresh reactor and renders the result as JSON.
pub fn run(config: &Config, command: Command) -> Result<String, FailureError> {
    let mut core = Core::new().map_err(|e| FailureError::from(e.context("Cannot create event loop core")))?;
    let service = build_check_service(config, &core.handle())?;

    match command {
        Command::Check(postcode) => render(core.run(service.check(&postcode))?),
        Command::Quote(postcode, subtotal) => render(core.run(service.quote(&postcode, subtotal))?),
        Command::Distance(from, to) => render(core.run(service.distance(&from, &to))?),
        Command::Zones => render(core.run(service.evaluator().delivery_zones())?),
        Command::Status => render(core.run(service.evaluator().status())?),
    }
}

fn render<T: Serialize>(value: T) -> Result<String, FailureError> {
    serde_json::to_string_pretty(&value).map_err(From::from)
}
