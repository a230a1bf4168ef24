use taxoclass::{Module, ModuleMatcher, TaxonomyError};

#[test]
fn test_round_trip_all_two_digit_codes() {
    for delimiter in ["_", "."] {
        let matcher = ModuleMatcher::new("", &[delimiter]).unwrap();
        for section in 1..=99 {
            for module in 1..=99 {
                let code = Module::new(section, module).unwrap();
                let decoded = matcher.parse(&code.to_code(delimiter)).unwrap();
                assert_eq!(decoded, code);
            }
        }
    }
}

#[test]
fn test_label_round_trip() {
    let matcher = ModuleMatcher::new("__label__", &["_", "."]).unwrap();
    for section in [1, 9, 10, 99] {
        for module in [1, 9, 10, 99] {
            let code = Module::new(section, module).unwrap();
            let label = code.to_label("__label__", "_");
            assert_eq!(matcher.parse(&label).unwrap(), code);
        }
    }
}

#[test]
fn test_case_tolerance() {
    let expected = Module::new(1, 1).unwrap();
    assert_eq!(Module::parse("s1.m1", "", &["."]).unwrap(), expected);
    assert_eq!(Module::parse("S1.M1", "", &["."]).unwrap(), expected);
    assert_eq!(Module::parse("s1.M1", "", &["."]).unwrap(), expected);
}

#[test]
fn test_delimiter_exclusivity() {
    assert!(matches!(
        Module::parse("s1.m1", "", &["_"]),
        Err(TaxonomyError::InvalidCode(_))
    ));
}

#[test]
fn test_prefix_exactness() {
    assert!(Module::parse("s1.m1", "__label__", &["."]).is_err());
    assert_eq!(
        Module::parse("__label__s1.m1", "__label__", &["."]).unwrap(),
        Module::new(1, 1).unwrap()
    );
}

#[test]
fn test_no_zero_padding() {
    let code = Module::new(1, 10).unwrap();
    assert_eq!(code.to_code("_"), "S1_M10");
    assert_eq!(code.to_label("__label__", "."), "__label__S1.M10");
}
