//! Locale-aware number, currency, percentage and date formatting

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::value::Value;

lazy_static! {
    /// Bracketed literals first, then longest tokens so `YYYY` never matches as two `YY`
    static ref DATE_TOKEN: Regex =
        Regex::new(r"\[([^\]]*)\]|YYYY|YY|MMMM|MMM|MM|M|DD|D").unwrap();
}

/// Fraction digits are capped here, as `Intl.NumberFormat` caps them
pub const MAX_FRACTION_DIGITS: usize = 20;

const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const DE_MONTHS: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];
const FR_MONTHS: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];
const ES_MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];
const JA_MONTHS: [&str; 12] = [
    "1月", "2月", "3月", "4月", "5月", "6月", "7月", "8月", "9月", "10月", "11月", "12月",
];

/// Separators and conventions for one locale
#[derive(Debug)]
pub struct LocaleFormat {
    pub tag: &'static str,
    pub group_separator: &'static str,
    pub decimal_separator: &'static str,
    /// Currency symbol follows the amount (`1.234,50 €`)
    pub symbol_after: bool,
    /// Space between the number and `%`
    pub percent_space: bool,
    pub month_names: &'static [&'static str; 12],
    /// Pattern used when `formatDate` gets no explicit format
    pub date_pattern: &'static str,
}

static EN_US: LocaleFormat = LocaleFormat {
    tag: "en-US",
    group_separator: ",",
    decimal_separator: ".",
    symbol_after: false,
    percent_space: false,
    month_names: &EN_MONTHS,
    date_pattern: "MMMM D, YYYY",
};

static EN_GB: LocaleFormat = LocaleFormat {
    tag: "en-GB",
    group_separator: ",",
    decimal_separator: ".",
    symbol_after: false,
    percent_space: false,
    month_names: &EN_MONTHS,
    date_pattern: "D MMMM YYYY",
};

static DE_DE: LocaleFormat = LocaleFormat {
    tag: "de-DE",
    group_separator: ".",
    decimal_separator: ",",
    symbol_after: true,
    percent_space: true,
    month_names: &DE_MONTHS,
    date_pattern: "D. MMMM YYYY",
};

static FR_FR: LocaleFormat = LocaleFormat {
    tag: "fr-FR",
    group_separator: "\u{202f}",
    decimal_separator: ",",
    symbol_after: true,
    percent_space: true,
    month_names: &FR_MONTHS,
    date_pattern: "D MMMM YYYY",
};

static ES_ES: LocaleFormat = LocaleFormat {
    tag: "es-ES",
    group_separator: ".",
    decimal_separator: ",",
    symbol_after: true,
    percent_space: true,
    month_names: &ES_MONTHS,
    date_pattern: "D de MMMM de YYYY",
};

static JA_JP: LocaleFormat = LocaleFormat {
    tag: "ja-JP",
    group_separator: ",",
    decimal_separator: ".",
    symbol_after: false,
    percent_space: false,
    month_names: &JA_MONTHS,
    date_pattern: "YYYY年M月D日",
};

/// Resolve a BCP 47 tag to its formatting rules, falling back to en-US
pub fn locale_format(tag: &str) -> &'static LocaleFormat {
    let lower = tag.to_ascii_lowercase();
    if lower == "en-gb" {
        return &EN_GB;
    }
    match lower.split(['-', '_']).next().unwrap_or("") {
        "de" => &DE_DE,
        "fr" => &FR_FR,
        "es" => &ES_ES,
        "ja" => &JA_JP,
        _ => &EN_US,
    }
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// Fixed-precision number with locale grouping, without sign handling
fn format_magnitude(n: f64, decimals: usize, locale: &LocaleFormat) -> String {
    let fixed = format!("{:.*}", decimals.min(MAX_FRACTION_DIGITS), n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut out = group_digits(int_part, locale.group_separator);
    if let Some(frac) = frac_part {
        out.push_str(locale.decimal_separator);
        out.push_str(frac);
    }
    out
}

fn sign(n: f64, magnitude: &str) -> &'static str {
    if n < 0.0 && magnitude.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    }
}

/// `1234.5` -> `1,234.50` (en-US, 2 decimals)
pub fn format_number(n: f64, decimals: usize, locale: &LocaleFormat) -> String {
    let magnitude = format_magnitude(n, decimals, locale);
    format!("{}{}", sign(n, &magnitude), magnitude)
}

pub fn currency_symbol(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" | "CNY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        other => other.to_string(),
    }
}

/// Minor units used when no precision is given
pub fn currency_decimals(code: &str) -> usize {
    match code.to_ascii_uppercase().as_str() {
        "JPY" | "KRW" => 0,
        _ => 2,
    }
}

pub fn format_currency(n: f64, code: &str, decimals: usize, locale: &LocaleFormat) -> String {
    let magnitude = format_magnitude(n, decimals, locale);
    let symbol = currency_symbol(code);
    let sign = sign(n, &magnitude);
    if locale.symbol_after {
        format!("{}{}\u{a0}{}", sign, magnitude, symbol)
    } else if symbol.chars().count() > 1 {
        format!("{}{}\u{a0}{}", sign, symbol, magnitude)
    } else {
        format!("{}{}{}", sign, symbol, magnitude)
    }
}

/// Fraction to percentage: `0.125` -> `12.5%`
pub fn format_percentage(n: f64, decimals: usize, locale: &LocaleFormat) -> String {
    let number = format_number(n * 100.0, decimals, locale);
    if locale.percent_space {
        format!("{}\u{a0}%", number)
    } else {
        format!("{}%", number)
    }
}

/// Parse a date from an RFC 3339 / ISO string or epoch milliseconds
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(ms) => DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.date_naive()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.date_naive())
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
                .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                .ok()
        }
        _ => None,
    }
}

/// Format a date with `YYYY`, `YY`, `MMMM`, `MMM`, `MM`, `M`, `DD`, `D` tokens.
///
/// Text in square brackets is copied without the brackets, so `[Due] D MMMM`
/// keeps the `D` of "Due". Anything else outside a token is copied as is.
pub fn format_date(date: NaiveDate, pattern: &str, locale: &LocaleFormat) -> String {
    DATE_TOKEN
        .replace_all(pattern, |caps: &Captures| {
            if let Some(literal) = caps.get(1) {
                return literal.as_str().to_string();
            }
            let month_index = date.month0() as usize;
            match &caps[0] {
                "YYYY" => format!("{:04}", date.year()),
                "YY" => format!("{:02}", date.year().rem_euclid(100)),
                "MMMM" => locale.month_names[month_index].to_string(),
                "MMM" => locale.month_names[month_index].chars().take(3).collect(),
                "MM" => format!("{:02}", date.month()),
                "M" => date.month().to_string(),
                "DD" => format!("{:02}", date.day()),
                _ => date.day().to_string(),
            }
        })
        .into_owned()
}
