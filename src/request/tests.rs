use super::core::*;
use num_bigint::BigUint;

#[test]
fn test_parse_tokens_valid() {
    assert_eq!(parse_tokens(&["10", "5"]).unwrap(), vec![10, 5]);
    assert_eq!(parse_tokens(&["1", "1"]).unwrap(), vec![1, 1]);
}

#[test]
fn test_parse_tokens_empty() {
    let empty: [&str; 0] = [];
    assert_eq!(parse_tokens(&empty), Err(RequestError::EmptyInput));
    assert_eq!(parse_text("  \n\t "), Err(RequestError::EmptyInput));
}

#[test]
fn test_parse_tokens_rejects_non_positive() {
    assert!(matches!(
        parse_tokens(&["0", "1"]),
        Err(RequestError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_tokens(&["1", "-1"]),
        Err(RequestError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_tokens(&["+5"]),
        Err(RequestError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_tokens(&["foo"]),
        Err(RequestError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_tokens(&["1.5"]),
        Err(RequestError::InvalidInput(_))
    ));
}

#[test]
fn test_parse_positive_overflow() {
    let err = parse_positive("99999999999999999999999").unwrap_err();
    assert_eq!(
        err.to_string(),
        "incorrect input: \u{2018}99999999999999999999999\u{2019} is too large"
    );
}

#[test]
fn test_parse_text_mixed_whitespace() {
    assert_eq!(parse_text("3 1\n\t7\r\n").unwrap(), vec![3, 1, 7]);
}

#[test]
fn test_json_valid() {
    assert_eq!(parse_json_request(r#"{"numbers":[10,5]}"#).unwrap(), vec![10, 5]);
    assert_eq!(
        parse_json_request(r#"{"numbers":[19, 20], "extra": true}"#).unwrap(),
        vec![19, 20]
    );
}

#[test]
fn test_json_empty_cases() {
    assert_eq!(parse_json_request("{}"), Err(RequestError::EmptyInput));
    assert_eq!(
        parse_json_request(r#"{"numbers":[]}"#),
        Err(RequestError::EmptyInput)
    );
    assert_eq!(
        parse_json_request(r#"{"numbers":null}"#),
        Err(RequestError::EmptyInput)
    );
}

#[test]
fn test_json_invalid_cases() {
    for body in [
        "",
        "foo",
        r#"{"numbers":[0,1]}"#,
        r#"{"numbers":[1,-1]}"#,
        r#"{"numbers":["1","1"]}"#,
        r#"{"numbers":[1.5]}"#,
        r#"[1,2]"#,
        r#"[[5]]"#,
        r#"[]"#,
        r#"[null]"#,
        r#""numbers""#,
        "5",
    ] {
        assert!(
            matches!(parse_json_request(body), Err(RequestError::InvalidInput(_))),
            "body {:?} should be invalid",
            body
        );
    }
}

#[test]
fn test_json_bytes_not_utf8() {
    let body = b"{\"numbers\":[5],\"note\":\"\xff\"}";
    assert!(matches!(
        parse_json_bytes(body),
        Err(RequestError::InvalidInput(_))
    ));
    assert_eq!(parse_json_bytes(br#"{"numbers":[3]}"#).unwrap(), vec![3]);
}

#[test]
fn test_error_messages() {
    assert_eq!(RequestError::EmptyInput.to_string(), "no numbers in input");
    assert!(
        RequestError::InvalidInput("x".into())
            .to_string()
            .starts_with("incorrect input")
    );
}

#[test]
fn test_format_json_array() {
    let results = vec![
        BigUint::from(3628800u32),
        BigUint::from(120u32),
    ];
    assert_eq!(format_json_array(&results), "[3628800,120]");
    assert_eq!(format_json_array(&[]), "[]");
}

#[test]
fn test_format_json_array_large() {
    let f20: BigUint = "2432902008176640000".parse().unwrap();
    let f19: BigUint = "121645100408832000".parse().unwrap();
    assert_eq!(
        format_json_array(&[f19, f20]),
        "[121645100408832000,2432902008176640000]"
    );
}

#[test]
fn test_format_lines() {
    let out = format_lines(&[5, 1], &[BigUint::from(120u32), BigUint::from(1u32)]);
    assert_eq!(out, "5: 120\n1: 1\n");
}
