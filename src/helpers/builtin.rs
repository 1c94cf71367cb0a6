//! Built-in helpers

use std::cmp::Ordering;

use crate::error::HelperError;
use crate::value::Value;

use super::format::{
    currency_decimals, format_currency, format_date, format_number, format_percentage,
    locale_format, parse_date,
};
use super::FormatDefaults;

/// Every helper the engine ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinHelper {
    FormatDate,
    FormatCurrency,
    FormatPercentage,
    FormatNumber,
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Add,
    Subtract,
    Multiply,
    Divide,
    Uppercase,
    Lowercase,
    Capitalize,
    Truncate,
}

impl BuiltinHelper {
    pub const ALL: [BuiltinHelper; 18] = [
        BuiltinHelper::FormatDate,
        BuiltinHelper::FormatCurrency,
        BuiltinHelper::FormatPercentage,
        BuiltinHelper::FormatNumber,
        BuiltinHelper::Eq,
        BuiltinHelper::Ne,
        BuiltinHelper::Gt,
        BuiltinHelper::Gte,
        BuiltinHelper::Lt,
        BuiltinHelper::Lte,
        BuiltinHelper::Add,
        BuiltinHelper::Subtract,
        BuiltinHelper::Multiply,
        BuiltinHelper::Divide,
        BuiltinHelper::Uppercase,
        BuiltinHelper::Lowercase,
        BuiltinHelper::Capitalize,
        BuiltinHelper::Truncate,
    ];

    /// Name used in markup
    pub fn name(self) -> &'static str {
        match self {
            BuiltinHelper::FormatDate => "formatDate",
            BuiltinHelper::FormatCurrency => "formatCurrency",
            BuiltinHelper::FormatPercentage => "formatPercentage",
            BuiltinHelper::FormatNumber => "formatNumber",
            BuiltinHelper::Eq => "eq",
            BuiltinHelper::Ne => "ne",
            BuiltinHelper::Gt => "gt",
            BuiltinHelper::Gte => "gte",
            BuiltinHelper::Lt => "lt",
            BuiltinHelper::Lte => "lte",
            BuiltinHelper::Add => "add",
            BuiltinHelper::Subtract => "subtract",
            BuiltinHelper::Multiply => "multiply",
            BuiltinHelper::Divide => "divide",
            BuiltinHelper::Uppercase => "uppercase",
            BuiltinHelper::Lowercase => "lowercase",
            BuiltinHelper::Capitalize => "capitalize",
            BuiltinHelper::Truncate => "truncate",
        }
    }

    pub fn call(self, args: &[Value], defaults: &FormatDefaults) -> Result<Value, HelperError> {
        match self {
            BuiltinHelper::FormatDate => self.format_date(args, defaults),
            BuiltinHelper::FormatCurrency | BuiltinHelper::FormatPercentage | BuiltinHelper::FormatNumber
                if args.first().map_or(true, Value::is_null) =>
            {
                Ok(Value::String(String::new()))
            }
            BuiltinHelper::FormatCurrency => {
                let amount = self.number_arg(args, 0)?;
                let code = string_arg(args, 1).unwrap_or(&defaults.currency);
                let locale = locale_format(string_arg(args, 2).unwrap_or(&defaults.locale));
                let decimals = self.decimals_arg(args, 3, currency_decimals(code))?;
                Ok(Value::String(format_currency(amount, code, decimals, locale)))
            }
            BuiltinHelper::FormatPercentage => {
                let ratio = self.number_arg(args, 0)?;
                let decimals = self.decimals_arg(args, 1, 1)?;
                let locale = locale_format(string_arg(args, 2).unwrap_or(&defaults.locale));
                Ok(Value::String(format_percentage(ratio, decimals, locale)))
            }
            BuiltinHelper::FormatNumber => {
                let n = self.number_arg(args, 0)?;
                let decimals = self.decimals_arg(args, 1, 0)?;
                let locale = locale_format(string_arg(args, 2).unwrap_or(&defaults.locale));
                Ok(Value::String(format_number(n, decimals, locale)))
            }
            BuiltinHelper::Eq => {
                self.arity(args, 2)?;
                Ok(Value::Bool(loose_eq(&args[0], &args[1])))
            }
            BuiltinHelper::Ne => {
                self.arity(args, 2)?;
                Ok(Value::Bool(!loose_eq(&args[0], &args[1])))
            }
            BuiltinHelper::Gt => self.compare(args, |o| o == Ordering::Greater),
            BuiltinHelper::Gte => self.compare(args, |o| o != Ordering::Less),
            BuiltinHelper::Lt => self.compare(args, |o| o == Ordering::Less),
            BuiltinHelper::Lte => self.compare(args, |o| o != Ordering::Greater),
            BuiltinHelper::Add => self.arithmetic(args, |a, b| a + b),
            BuiltinHelper::Subtract => self.arithmetic(args, |a, b| a - b),
            BuiltinHelper::Multiply => self.arithmetic(args, |a, b| a * b),
            BuiltinHelper::Divide => self.arithmetic(args, |a, b| if b == 0.0 { 0.0 } else { a / b }),
            BuiltinHelper::Uppercase => Ok(Value::String(text_arg(args).to_uppercase())),
            BuiltinHelper::Lowercase => Ok(Value::String(text_arg(args).to_lowercase())),
            BuiltinHelper::Capitalize => {
                let text = text_arg(args);
                let mut chars = text.chars();
                let capitalized = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                };
                Ok(Value::String(capitalized))
            }
            BuiltinHelper::Truncate => {
                let text = text_arg(args);
                let limit = self.decimals_arg(args, 1, 100)?;
                let suffix = string_arg(args, 2).unwrap_or("...");
                if text.chars().count() <= limit {
                    Ok(Value::String(text))
                } else {
                    let head: String = text.chars().take(limit).collect();
                    Ok(Value::String(format!("{}{}", head, suffix)))
                }
            }
        }
    }

    fn format_date(self, args: &[Value], defaults: &FormatDefaults) -> Result<Value, HelperError> {
        self.arity(args, 1)?;
        if args[0].is_null() {
            return Ok(Value::String(String::new()));
        }
        let date = parse_date(&args[0]).ok_or_else(|| HelperError::Custom {
            name: self.name().to_string(),
            message: format!("invalid date '{}'", args[0]),
        })?;
        let locale = locale_format(string_arg(args, 2).unwrap_or(&defaults.locale));
        let pattern = string_arg(args, 1).unwrap_or(locale.date_pattern);
        Ok(Value::String(format_date(date, pattern, locale)))
    }

    fn arity(self, args: &[Value], expected: usize) -> Result<(), HelperError> {
        if args.len() < expected {
            return Err(HelperError::Arity {
                name: self.name().to_string(),
                expected,
                actual: args.len(),
            });
        }
        Ok(())
    }

    fn number_arg(self, args: &[Value], index: usize) -> Result<f64, HelperError> {
        self.arity(args, index + 1)?;
        args[index].as_number().ok_or_else(|| HelperError::NotANumber {
            name: self.name().to_string(),
            value: args[index].render(),
        })
    }

    /// Optional non-negative integer argument (precision, length)
    fn decimals_arg(self, args: &[Value], index: usize, default: usize) -> Result<usize, HelperError> {
        match args.get(index) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => Ok(self.number_arg(args, index)?.max(0.0) as usize),
        }
    }

    fn compare(self, args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, HelperError> {
        self.arity(args, 2)?;
        let ordering = match (&args[0], &args[1]) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        };
        Ok(Value::Bool(ordering.map(accept).unwrap_or(false)))
    }

    fn arithmetic(self, args: &[Value], op: fn(f64, f64) -> f64) -> Result<Value, HelperError> {
        let a = self.number_arg(args, 0)?;
        let b = self.number_arg(args, 1)?;
        Ok(Value::Number(op(a, b)))
    }
}

fn string_arg(args: &[Value], index: usize) -> Option<&str> {
    args.get(index).and_then(Value::as_str)
}

fn text_arg(args: &[Value]) -> String {
    args.first().map(Value::render).unwrap_or_default()
}

/// Equality that treats `5` and `"5"` as equal
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::String(s)) | (Value::String(s), Value::Number(x)) => {
            s.trim().parse::<f64>().map(|y| y == *x).unwrap_or(false)
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(helper: BuiltinHelper, args: Vec<Value>) -> Result<Value, HelperError> {
        helper.call(&args, &FormatDefaults::default())
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        let result = call(BuiltinHelper::Divide, vec![5.0.into(), 0.0.into()]).unwrap();
        assert_eq!(result, Value::Number(0.0));

        let result = call(BuiltinHelper::Divide, vec![9.0.into(), 3.0.into()]).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_arithmetic_coerces_numeric_strings() {
        let result = call(BuiltinHelper::Add, vec!["2".into(), 3.0.into()]).unwrap();
        assert_eq!(result, Value::Number(5.0));

        let err = call(BuiltinHelper::Multiply, vec!["abc".into(), 3.0.into()]).unwrap_err();
        assert!(matches!(err, HelperError::NotANumber { .. }));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            call(BuiltinHelper::Gt, vec![10.0.into(), 2.0.into()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(BuiltinHelper::Lte, vec![2.0.into(), 2.0.into()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(BuiltinHelper::Lt, vec!["b".into(), "a".into()]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            call(BuiltinHelper::Eq, vec![5.0.into(), "5".into()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(BuiltinHelper::Ne, vec!["enterprise".into(), "professional".into()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(BuiltinHelper::Gt, vec![Value::Null, 1.0.into()]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_comparison_arity() {
        let err = call(BuiltinHelper::Eq, vec![1.0.into()]).unwrap_err();
        assert!(matches!(err, HelperError::Arity { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(
            call(BuiltinHelper::Uppercase, vec!["acme".into()]).unwrap(),
            Value::from("ACME")
        );
        assert_eq!(
            call(BuiltinHelper::Capitalize, vec!["valuation report".into()]).unwrap(),
            Value::from("Valuation report")
        );
        assert_eq!(
            call(BuiltinHelper::Truncate, vec!["abcdefgh".into(), 3.0.into()]).unwrap(),
            Value::from("abc...")
        );
        assert_eq!(
            call(BuiltinHelper::Truncate, vec!["abc".into(), 5.0.into()]).unwrap(),
            Value::from("abc")
        );
        assert_eq!(
            call(BuiltinHelper::Lowercase, vec![]).unwrap(),
            Value::from("")
        );
    }

    #[test]
    fn test_format_helpers_use_defaults() {
        assert_eq!(
            call(BuiltinHelper::FormatCurrency, vec![2500000.0.into()]).unwrap(),
            Value::from("$2,500,000.00")
        );
        assert_eq!(
            call(
                BuiltinHelper::FormatCurrency,
                vec![2500.0.into(), "EUR".into(), "de-DE".into(), 0.0.into()]
            )
            .unwrap(),
            Value::from("2.500\u{a0}€")
        );
        assert_eq!(
            call(BuiltinHelper::FormatPercentage, vec![0.153.into()]).unwrap(),
            Value::from("15.3%")
        );
        assert_eq!(
            call(BuiltinHelper::FormatNumber, vec![12345.678.into(), 1.0.into()]).unwrap(),
            Value::from("12,345.7")
        );
        assert_eq!(
            call(BuiltinHelper::FormatDate, vec!["2024-06-30".into(), "DD/MM/YYYY".into()])
                .unwrap(),
            Value::from("30/06/2024")
        );
        assert_eq!(
            call(BuiltinHelper::FormatDate, vec!["2024-06-30".into()]).unwrap(),
            Value::from("June 30, 2024")
        );
    }

    #[test]
    fn test_number_formatters_render_missing_as_empty() {
        for helper in [
            BuiltinHelper::FormatCurrency,
            BuiltinHelper::FormatPercentage,
            BuiltinHelper::FormatNumber,
        ] {
            assert_eq!(call(helper, vec![]).unwrap(), Value::from(""));
            assert_eq!(call(helper, vec![Value::Null, 2.0.into()]).unwrap(), Value::from(""));
        }
        let err = call(BuiltinHelper::FormatNumber, vec!["n/a".into()]).unwrap_err();
        assert!(matches!(err, HelperError::NotANumber { .. }));
    }

    #[test]
    fn test_oversized_precision_is_capped() {
        assert_eq!(
            call(BuiltinHelper::FormatNumber, vec![1.0.into(), 70000.0.into()]).unwrap(),
            Value::from(format!("1.{}", "0".repeat(20)))
        );
        assert!(call(BuiltinHelper::FormatCurrency, vec![1.0.into(), "USD".into(), "en-US".into(), 3.0e9.into()]).is_ok());
        assert!(call(BuiltinHelper::FormatPercentage, vec![0.5.into(), 1.0e12.into()]).is_ok());
    }

    #[test]
    fn test_format_date_rejects_garbage() {
        let err = call(BuiltinHelper::FormatDate, vec!["yesterday".into()]).unwrap_err();
        assert!(matches!(err, HelperError::Custom { .. }));
    }
}
