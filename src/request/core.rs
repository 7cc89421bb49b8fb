/// Request decoding and response encoding around the factorial engine.
///
/// Everything here runs before the engine is dispatched: a request is either
/// fully valid or rejected, never partially computed.
use std::fmt::Write as _;

use num_bigint::BigUint;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Unparseable payload, or a value that is not a positive integer.
    #[error("incorrect input: {0}")]
    InvalidInput(String),

    #[error("no numbers in input")]
    EmptyInput,
}

/// JSON request body: `{"numbers": [..]}`.
#[derive(Debug, Deserialize)]
struct InputQuery {
    #[serde(default)]
    numbers: Option<Vec<i64>>,
}

/// Parse one decimal token as a positive integer.
pub fn parse_positive(token: &str) -> Result<u64, RequestError> {
    let invalid = || {
        RequestError::InvalidInput(format!(
            "\u{2018}{}\u{2019} is not a valid positive integer",
            token
        ))
    };
    // Digits only: rejects signs, which u64::from_str would accept as "+5".
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match token.parse::<u64>() {
        Ok(0) => Err(invalid()),
        Ok(n) => Ok(n),
        Err(_) => Err(RequestError::InvalidInput(format!(
            "\u{2018}{}\u{2019} is too large",
            token
        ))),
    }
}

/// Validate every token; the first bad one rejects the whole batch.
pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<u64>, RequestError> {
    if tokens.is_empty() {
        return Err(RequestError::EmptyInput);
    }
    tokens.iter().map(|t| parse_positive(t.as_ref())).collect()
}

/// Split whitespace-delimited input and validate each token.
pub fn parse_text(input: &str) -> Result<Vec<u64>, RequestError> {
    let tokens: Vec<&str> = input.split_ascii_whitespace().collect();
    parse_tokens(&tokens)
}

/// Decode a `{"numbers": [..]}` request body.
///
/// A missing, null or empty list is [`RequestError::EmptyInput`]; anything
/// that fails to decode, or any value below 1, is [`RequestError::InvalidInput`].
pub fn parse_json_request(body: &str) -> Result<Vec<u64>, RequestError> {
    parse_json_bytes(body.as_bytes())
}

/// Like [`parse_json_request`], for a raw body. Bytes that are not UTF-8
/// fail to decode and are [`RequestError::InvalidInput`].
pub fn parse_json_bytes(body: &[u8]) -> Result<Vec<u64>, RequestError> {
    let decode_error = |e: serde_json::Error| RequestError::InvalidInput(e.to_string());
    let value: serde_json::Value = serde_json::from_slice(body).map_err(decode_error)?;
    // Derived struct decoding also takes a sequence form (`[[5]]`); only an
    // object is a request.
    if !value.is_object() {
        return Err(RequestError::InvalidInput(
            "request body must be a JSON object".to_string(),
        ));
    }
    let query = InputQuery::deserialize(value).map_err(decode_error)?;
    let numbers = query.numbers.unwrap_or_default();
    if numbers.is_empty() {
        return Err(RequestError::EmptyInput);
    }
    numbers
        .into_iter()
        .map(|n| {
            if n > 0 {
                Ok(n as u64)
            } else {
                Err(RequestError::InvalidInput(format!(
                    "{} is not a positive integer",
                    n
                )))
            }
        })
        .collect()
}

/// Render results as a JSON array of bare decimal integers, e.g. `[1,120]`.
pub fn format_json_array(results: &[BigUint]) -> String {
    let mut out = String::with_capacity(2 + results.len() * 8);
    out.push('[');
    for (i, r) in results.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", r);
    }
    out.push(']');
    out
}

/// Render one `N: N!` line per input, in input order.
pub fn format_lines(values: &[u64], results: &[BigUint]) -> String {
    let mut out = String::new();
    for (v, r) in values.iter().zip(results) {
        let _ = writeln!(out, "{}: {}", v, r);
    }
    out
}
