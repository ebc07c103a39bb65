//! JSON replay vector loader shared by ledger tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

use resmeter_core::{Event, Series};

#[derive(Debug, Deserialize)]
pub struct ReplayVector {
    pub description: String,
    pub identity: String,
    pub events: Vec<Event<'static>>,
    pub expect: Expect,
}

#[derive(Debug, Default, Deserialize)]
pub struct Expect {
    #[serde(default)]
    pub gauges: Vec<Expected<i64>>,
    #[serde(default)]
    pub counters: Vec<Expected<u64>>,
    #[serde(default)]
    pub observations: Vec<ExpectedObservations>,
    #[serde(default)]
    pub violations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Expected<T> {
    pub series: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub value: T,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedObservations {
    pub series: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub values: Vec<u64>,
}

pub fn series(name: &str) -> Series {
    Series::by_name(name).unwrap_or_else(|| panic!("unknown series in vector: {name}"))
}

pub fn load(name: &str) -> ReplayVector {
    let path = format!("{}/tests/vectors/{name}", env!("CARGO_MANIFEST_DIR"));
    let s = fs::read_to_string(&path).unwrap_or_else(|e| panic!("{path}: {e}"));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("{path}: {e}"))
}
