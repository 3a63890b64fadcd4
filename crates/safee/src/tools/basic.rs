//! The demonstration tools: pure functions with no outbound calls.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AddArgs {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Deserialize)]
pub struct GreetArgs {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherArgs {
    pub city: String,
}

pub fn add(args: &AddArgs) -> i64 {
    args.a + args.b
}

pub fn greet(args: &GreetArgs) -> String {
    format!("Hello mate, {}! How can I assist you today?", args.name)
}

pub fn weather(args: &WeatherArgs) -> String {
    format!(
        "The weather in {} is sunny with a high of 25°C.",
        args.city
    )
}
