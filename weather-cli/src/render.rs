//! Text views for the three session phases.
//!
//! Pure functions of the session: nothing here fetches or derives data
//! beyond flooring temperatures and picking an icon glyph.

use std::fmt::Write;

use weather_core::{Phase, Session, WeatherIcon, WeatherRecord};

const TITLE: &str = "WEATHER APP";

pub fn render(session: &Session) -> String {
    match session.phase() {
        Phase::Idle => idle_view(),
        Phase::Result(record) => result_view(record),
        Phase::Error => not_found_view(),
    }
}

fn idle_view() -> String {
    format!("\n  {TITLE}\n\n  Enter a city name to look up the current weather.\n")
}

fn not_found_view() -> String {
    format!("{TITLE}\n\n  Sorry, the specified city was not found...\n")
}

fn result_view(w: &WeatherRecord) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{TITLE}\n");
    let _ = writeln!(out, "  {}, {}", w.city, w.country);
    let _ = writeln!(out, "  {}", w.current_date);
    let _ = writeln!(out, "  {}\n", w.current_time);
    let _ = writeln!(
        out,
        "  {}  {}  {}\n",
        glyph(w.icon()),
        degrees(w.temp),
        capitalize_first(&w.description)
    );

    let details = [
        ("Highest Temp", degrees(w.highest_temp)),
        ("Wind", format!("{}m/s", w.wind)),
        ("Sunrise", w.sunrise.clone()),
        ("Lowest Temp", degrees(w.lowest_temp)),
        ("Humidity", format!("{}%", w.humidity)),
        ("Sunset", w.sunset.clone()),
    ];
    for row in details.chunks(3) {
        let line: Vec<String> =
            row.iter().map(|(label, value)| format!("{label:>12}: {value:<9}")).collect();
        let _ = writeln!(out, "{}", line.join(" ").trim_end());
    }

    out
}

pub fn glyph(icon: WeatherIcon) -> &'static str {
    match icon {
        WeatherIcon::Bolt => "⚡",
        WeatherIcon::LightRain => "🌦",
        WeatherIcon::HeavyRain => "🌧",
        WeatherIcon::Snowflake => "❄",
        WeatherIcon::Sun => "☀",
        WeatherIcon::Cloud => "☁",
        WeatherIcon::Haze => "🌫",
    }
}

fn degrees(celsius: f64) -> String {
    format!("{}°", celsius.floor() as i64)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
