use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
        }
    }

    fn weekday_name(&self, index: usize) -> &'static str {
        const FR: [&str; 7] = [
            "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi", "Dimanche",
        ];
        const EN: [&str; 7] = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ];
        match self {
            Locale::Fr => FR[index],
            Locale::En => EN[index],
        }
    }

    fn month_name(&self, index: usize) -> &'static str {
        const FR: [&str; 12] = [
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
            "septembre", "octobre", "novembre", "décembre",
        ];
        const EN: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        match self {
            Locale::Fr => FR[index],
            Locale::En => EN[index],
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnsupportedLocale(pub String);

impl fmt::Display for UnsupportedLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language: {}", self.0)
    }
}

impl std::error::Error for UnsupportedLocale {}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" => Ok(Locale::Fr),
            "en" => Ok(Locale::En),
            other => Err(UnsupportedLocale(other.to_string())),
        }
    }
}

/// Salutation for the hour of day, followed by the first name when known
pub fn greeting(hour: u32, locale: Locale, first_name: Option<&str>) -> String {
    let base = match (locale, hour) {
        (Locale::Fr, 5..=11) => "Bonjour",
        (Locale::Fr, 12..=17) => "Bon après-midi",
        (Locale::Fr, _) => "Bonsoir",
        (Locale::En, 5..=11) => "Good morning",
        (Locale::En, 12..=17) => "Good afternoon",
        (Locale::En, _) => "Good evening",
    };

    match first_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{base} {name}"),
        None => base.to_string(),
    }
}

/// "Lundi 3 mars 2025" or "Monday 3 March 2025"
pub fn long_date(now: NaiveDateTime, locale: Locale) -> String {
    format!(
        "{} {} {} {}",
        locale.weekday_name(now.weekday().num_days_from_monday() as usize),
        now.day(),
        locale.month_name(now.month0() as usize),
        now.year()
    )
}

/// `dd/mm/yyyy` in French, `mm/dd/yyyy` in English
pub fn short_date(now: NaiveDateTime, locale: Locale) -> String {
    match locale {
        Locale::Fr => now.format("%d/%m/%Y").to_string(),
        Locale::En => now.format("%m/%d/%Y").to_string(),
    }
}

/// Header shown on every staff page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    pub current_date: String,
    pub current_date_short: String,
    pub greeting: String,
    pub locale: Locale,
}

impl PageHeader {
    pub fn at(now: NaiveDateTime, locale: Locale, first_name: Option<&str>) -> Self {
        Self {
            current_date: long_date(now, locale),
            current_date_short: short_date(now, locale),
            greeting: greeting(now.hour(), locale, first_name),
            locale,
        }
    }

    pub fn now(locale: Locale, first_name: Option<&str>) -> Self {
        Self::at(chrono::Local::now().naive_local(), locale, first_name)
    }
}
