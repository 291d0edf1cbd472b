//! Plain-text rendering of dashboard regions.

use wxdash_core::{Category, DayForecast, FORECAST_DAYS, ForecastSnapshot, classify_condition};

use crate::dashboard::{Dashboard, Level, Notice, Region};

const CARD_WIDTH: usize = 18;
const CARD_GAP: &str = "  ";

pub fn render_dashboard(title: &str, dash: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str(&banner(title));
    out.push('\n');
    out.push_str(&render_current(&dash.forecast));
    out.push_str("\n5-Day Forecast\n");
    out.push_str(&render_forecast(&dash.forecast));
    out
}

fn banner(title: &str) -> String {
    let rule = "═".repeat(title.chars().count() + 4);
    format!("{rule}\n  {title}\n{rule}\n")
}

pub fn render_current(region: &Region<ForecastSnapshot>) -> String {
    let snap = match region {
        Region::Loading => return "  Loading current weather...\n".to_string(),
        Region::Empty => return "  No weather data available\n".to_string(),
        Region::Ready(snap) => snap,
    };

    let current = &snap.current;
    let category = classify_condition(&current.condition);

    let mut out = String::new();
    out.push_str(&format!("{}\n", snap.location.display_name()));
    out.push_str(&format!("Last updated {}\n", current.last_updated));
    out.push_str(&format!(
        "  {} {}°C  {}\n",
        category.glyph(),
        current.temperature_c,
        current.condition
    ));
    out.push_str(&format!("  Feels like {}°C\n", current.feels_like_c));
    out.push_str(&format!(
        "  Wind {} km/h   Humidity {}% {}\n",
        current.wind_kph,
        current.humidity_pct,
        humidity_bar(current.humidity_pct)
    ));
    if !current.icon_url.is_empty() {
        out.push_str(&format!("  Icon {}\n", current.icon_url));
    }
    out
}

pub fn render_forecast(region: &Region<ForecastSnapshot>) -> String {
    let cards: Vec<Vec<String>> = match region {
        Region::Loading => (0..FORECAST_DAYS).map(|_| skeleton_card()).collect(),
        Region::Empty => return "  No forecast data available\n".to_string(),
        Region::Ready(snap) => snap.days().iter().map(day_card).collect(),
    };
    side_by_side(&cards)
}

pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.level {
        Level::Info => "✔",
        Level::Error => "✖",
    };
    format!("{marker} {}: {}", notice.title, notice.description)
}

fn day_card(day: &DayForecast) -> Vec<String> {
    let category: Category = classify_condition(&day.condition);
    let precip_marker = if day.is_snow { "❄" } else { "☂" };

    vec![
        day.date.format("%a, %b %-d").to_string(),
        format!("{} {}", category.glyph(), category.as_str()),
        format!("{}°C", day.avg_temp_c.round() as i64),
        truncate(&day.condition, CARD_WIDTH),
        format!("{precip_marker} {}%", day.precipitation_chance),
    ]
}

fn skeleton_card() -> Vec<String> {
    (0..5).map(|_| "░".repeat(CARD_WIDTH - 4)).collect()
}

fn side_by_side(cards: &[Vec<String>]) -> String {
    let height = cards.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = String::new();

    for row in 0..height {
        let line: Vec<String> = cards
            .iter()
            .map(|card| pad(card.get(row).map(String::as_str).unwrap_or(""), CARD_WIDTH))
            .collect();
        out.push_str(line.join(CARD_GAP).trim_end());
        out.push('\n');
    }
    out
}

fn humidity_bar(pct: u8) -> String {
    let filled = ((usize::from(pct) + 5) / 10).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width { text.to_string() } else { format!("{text}{}", " ".repeat(width - len)) }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width - 1).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;
    use wxdash_core::provider::mock::MockProvider;

    fn ready() -> Region<ForecastSnapshot> {
        let snap = MockProvider::new("Krumovgrad,Bulgaria".into(), Duration::ZERO)
            .snapshot_for(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
            .unwrap();
        Region::Ready(snap)
    }

    #[test]
    fn loading_state_shows_placeholders() {
        assert!(render_current(&Region::Loading).contains("Loading current weather"));
        let forecast = render_forecast(&Region::Loading);
        assert_eq!(forecast.lines().count(), 5);
        assert!(forecast.contains('░'));
    }

    #[test]
    fn empty_state_shows_messages() {
        assert!(render_current(&Region::Empty).contains("No weather data available"));
        assert!(render_forecast(&Region::Empty).contains("No forecast data available"));
    }

    #[test]
    fn ready_state_renders_location_and_cards() {
        let region = ready();
        let current = render_current(&region);
        assert!(current.starts_with("Krumovgrad, Bulgaria"));
        assert!(current.contains("km/h"));

        let forecast = render_forecast(&region);
        assert!(forecast.lines().next().unwrap().starts_with("Fri, Oct 16"));
        assert!(forecast.contains("Tue, Oct 20"));
    }

    #[test]
    fn cards_use_rounded_average() {
        let day = DayForecast {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            min_temp_c: 2.0,
            max_temp_c: 9.0,
            avg_temp_c: 5.6,
            condition: "Heavy snow".into(),
            icon_url: String::new(),
            precipitation_chance: 80,
            is_snow: true,
        };
        let card = day_card(&day);
        assert_eq!(card[1], "❄ snowy");
        assert_eq!(card[2], "6°C");
        assert_eq!(card[4], "❄ 80%");
    }

    #[test]
    fn humidity_bar_has_ten_cells() {
        assert_eq!(humidity_bar(0), "░░░░░░░░░░");
        assert_eq!(humidity_bar(71), "███████░░░");
        assert_eq!(humidity_bar(100), "██████████");
    }

    #[test]
    fn long_conditions_are_truncated() {
        let out = truncate("Moderate or heavy rain with thunder", 18);
        assert_eq!(out.chars().count(), 18);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn notices_are_marked_by_level() {
        let ok = render_notice(&Notice::info("Weather data updated", "fresh"));
        assert!(ok.starts_with('✔'));
        let bad = render_notice(&Notice::error("Email required", "enter one"));
        assert_eq!(bad, "✖ Email required: enter one");
    }

    #[test]
    fn full_dashboard_has_both_regions() {
        let dash = Dashboard { forecast: ready() };
        let out = render_dashboard("Krumovgrad Weather Alerts", &dash);
        assert!(out.contains("Krumovgrad Weather Alerts"));
        assert!(out.contains("5-Day Forecast"));
    }
}
