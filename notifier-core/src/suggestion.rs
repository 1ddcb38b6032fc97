//! Maps a forecast line to a one-line suggestion for the email.

pub const UMBRELLA: &str = "Carry an umbrella.";
pub const WARM_CLOTHES: &str = "Wear warm clothes.";
pub const DEFAULT_SUGGESTION: &str = "Have a great day!";

/// Returns the suggestion for `forecast`.
///
/// The whole input is lower-cased and compared for equality, so only a bare
/// condition matches: `"Rain"` does, `"Rain, 18.3°C"` falls through to the
/// default.
pub fn get_suggestion(forecast: &str) -> &'static str {
    match forecast.to_lowercase().as_str() {
        "rain" => UMBRELLA,
        "snow" => WARM_CLOTHES,
        _ => DEFAULT_SUGGESTION,
    }
}
