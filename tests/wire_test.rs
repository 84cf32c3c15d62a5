#![allow(missing_docs)]

use rescode::{RescodeError, Token, TokenReader, TokenWriter};

fn collect_tokens(input: &str) -> Vec<Token<'_>> {
    let mut reader = TokenReader::new(input.as_bytes());
    let mut tokens = Vec::new();
    while let Some(token) = reader.next().unwrap() {
        tokens.push(token);
    }
    tokens
}

fn tokenize_err(input: &str) -> RescodeError {
    let mut reader = TokenReader::new(input.as_bytes());
    loop {
        match reader.next() {
            Ok(Some(_)) => {}
            Ok(None) => panic!("input should not tokenize cleanly: {input}"),
            Err(e) => return e,
        }
    }
}

#[test]
fn test_tokenize_flat_document() {
    let tokens = collect_tokens(r#"{ "a": 1, "b": "x", "c": true, "d": 2.5 }"#);
    assert_eq!(
        tokens,
        vec![
            Token::BeginMap,
            Token::Key("a".into()),
            Token::Int(1),
            Token::Key("b".into()),
            Token::Str("x".into()),
            Token::Key("c".into()),
            Token::Bool(true),
            Token::Key("d".into()),
            Token::Float(2.5),
            Token::EndMap,
        ]
    );
}

#[test]
fn test_tokenize_nested_and_null() {
    let tokens = collect_tokens(r#"{"outer":{"inner":null},"n":-42}"#);
    assert_eq!(
        tokens,
        vec![
            Token::BeginMap,
            Token::Key("outer".into()),
            Token::BeginMap,
            Token::Key("inner".into()),
            Token::Null,
            Token::EndMap,
            Token::Key("n".into()),
            Token::Int(-42),
            Token::EndMap,
        ]
    );
}

#[test]
fn test_tokenize_empty_collection_and_document() {
    assert_eq!(
        collect_tokens("{}"),
        vec![Token::BeginMap, Token::EndMap]
    );
    assert_eq!(collect_tokens("   "), Vec::<Token>::new());
}

#[test]
fn test_string_escapes_decode() {
    let tokens = collect_tokens(r#"{"k":"line\nquote\"back\\slash\ttab"}"#);
    match &tokens[2] {
        Token::Str(s) => assert_eq!(s.as_ref(), "line\nquote\"back\\slash\ttab"),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_unicode_escape_with_surrogate_pair() {
    // \u00e9 decodes to e-acute; the surrogate pair \ud83d \ude00 to an emoji.
    let tokens = collect_tokens(r#"{"k":"\u00e9 \ud83d\ude00"}"#);
    match &tokens[2] {
        Token::Str(s) => assert_eq!(s.as_ref(), "\u{e9} \u{1f600}"),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_unpaired_surrogate_is_rejected() {
    let err = tokenize_err(r#"{"k":"\ud83d oops"}"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_escape_free_strings_borrow_input() {
    let input = r#"{"key":"plain"}"#;
    let mut reader = TokenReader::new(input.as_bytes());
    reader.next().unwrap();
    let key = reader.next().unwrap().unwrap();
    match key {
        Token::Key(std::borrow::Cow::Borrowed(s)) => assert_eq!(s, "key"),
        other => panic!("expected borrowed key, got {other:?}"),
    }
}

#[test]
fn test_protocol_error_missing_colon() {
    let err = tokenize_err(r#"{"a" 1}"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_unquoted_key() {
    let err = tokenize_err(r#"{a: 1}"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_value_with_no_key() {
    // A bare value where a key is required after the separator.
    let err = tokenize_err(r#"{"a":1, 2}"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_trailing_comma() {
    let err = tokenize_err(r#"{"a":1,}"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_unterminated_collection() {
    let err = tokenize_err(r#"{"a":1"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_trailing_garbage() {
    let err = tokenize_err(r#"{"a":1} tail"#);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_bad_escape_and_bad_number() {
    assert!(matches!(
        tokenize_err(r#"{"a":"\q"}"#),
        RescodeError::Protocol(_)
    ));
    assert!(matches!(
        tokenize_err(r#"{"a":1e}"#),
        RescodeError::Protocol(_)
    ));
    assert!(matches!(
        tokenize_err(r#"{"a":--1}"#),
        RescodeError::Protocol(_)
    ));
}

#[test]
fn test_protocol_error_unescaped_control_character() {
    let err = tokenize_err("{\"a\":\"x\u{0001}y\"}");
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_protocol_error_nesting_too_deep() {
    let mut input = String::new();
    for _ in 0..200 {
        input.push_str(r#"{"k":"#);
    }
    let err = tokenize_err(&input);
    assert!(matches!(err, RescodeError::Protocol(_)), "{err}");
}

#[test]
fn test_expect_end_rejects_second_document() {
    let mut reader = TokenReader::new(br#"{} {}"#);
    while let Ok(Some(_)) = reader.next() {}
    // The loop above stops on the trailing-data error; replay to assert it.
    let mut reader = TokenReader::new(br#"{} {}"#);
    reader.next().unwrap();
    reader.next().unwrap();
    assert!(reader.expect_end().is_err());
}

// --- WRITER ---

#[test]
fn test_writer_separator_placement() {
    let mut writer = TokenWriter::unbounded();
    writer.begin_map();
    writer.key("a");
    writer.int(1);
    writer.end_entry();
    writer.key("b");
    writer.begin_map();
    writer.key("x");
    writer.bool(true);
    writer.end_entry();
    writer.end_map();
    writer.end_entry();
    writer.key("c");
    writer.string("s");
    writer.end_entry();
    writer.end_map();

    assert_eq!(writer.take(), br#"{"a":1,"b":{"x":true},"c":"s"}"#);
}

#[test]
fn test_writer_escaping_round_trips_through_reader() {
    let original = "quote\" slash\\ nl\n tab\t bell\u{0007} snowman☃";
    let mut writer = TokenWriter::unbounded();
    writer.begin_map();
    writer.key("k");
    writer.string(original);
    writer.end_entry();
    writer.end_map();
    let document = writer.take();

    let mut reader = TokenReader::new(&document);
    reader.next().unwrap(); // {
    reader.next().unwrap(); // key
    match reader.next().unwrap().unwrap() {
        Token::Str(s) => assert_eq!(s.as_ref(), original),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_writer_back_pressure_threshold() {
    let mut writer = TokenWriter::with_threshold(4);
    assert!(!writer.should_pause());
    writer.begin_map();
    assert!(!writer.should_pause());
    writer.key("key");
    assert!(writer.should_pause());

    let mut sink = Vec::new();
    writer.drain_to(&mut sink).unwrap();
    assert!(!writer.should_pause());
    assert_eq!(sink, br#"{"key":"#);
    assert_eq!(writer.total_flushed(), sink.len() as u64);
}

#[test]
fn test_writer_float_forms() {
    let mut writer = TokenWriter::unbounded();
    writer.begin_map();
    writer.key("a");
    writer.float(2.5);
    writer.end_entry();
    writer.key("b");
    writer.float(2.0); // integral float renders as an integer token
    writer.end_entry();
    writer.end_map();
    assert_eq!(writer.take(), br#"{"a":2.5,"b":2}"#);
}
