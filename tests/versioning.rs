use asdf_compat::version::{AsdfSpec, AsdfVersion};
use rstest::rstest;

fn v(text: &str) -> AsdfVersion {
    AsdfVersion::parse(text).unwrap()
}

#[test]
fn version_constructors_agree() {
    let from_text = v("1.0.0");
    let from_tuple = AsdfVersion::from((1_u64, 0, 0));
    let from_array = AsdfVersion::from([1_u64, 0, 0]);

    assert_eq!(from_text.to_string(), "1.0.0");
    assert_eq!(from_tuple.to_string(), "1.0.0");
    assert_eq!(from_array.to_string(), "1.0.0");
}

#[test]
fn version_equals_version() {
    let a = v("1.0.0");
    let b = v("1.0.0");

    assert!(a == b);
    assert!(b == a);
    assert!(!(a != b));
}

#[test]
fn version_equals_string_in_both_orders() {
    let version = v("1.0.0");

    assert!(version == "1.0.0");
    assert!("1.0.0" == version);
    assert!(!(version != "1.0.0"));
    assert!(!("1.0.0" != version));
    assert!(version == "1.0.0".to_string());
}

#[test]
fn version_equals_tuple_in_both_orders() {
    let version = v("1.0.0");

    assert!(version == (1_u64, 0, 0));
    assert!((1_u64, 0, 0) == version);
    assert!(!(version != (1_u64, 0, 0)));
    assert!(!((1_u64, 0, 0) != version));
    assert!(version == [1_u64, 0, 0]);
}

#[test]
fn distinct_versions_are_strictly_ordered() {
    let versions: Vec<AsdfVersion> = [
        "1.0.0", "1.0.1", "1.1.0", "1.1.1", "2.0.0", "2.0.1", "2.1.0", "2.1.1",
    ]
    .into_iter()
    .map(v)
    .collect();

    for (i, x) in versions.iter().enumerate() {
        for y in &versions[i + 1..] {
            assert!(x != y);
            assert!(x < y);
            assert!(x <= y);
            assert!(y > x);
            assert!(y >= x);
        }
    }
    assert!(versions[3] > versions[2]);
    assert!(!(versions[3] < versions[2]));
}

const COMPONENTS: [u64; 7] = [0, 1, 2, 10, 99, u64::MAX - 1, u64::MAX];

/// Every triple over `COMPONENTS`, generated in ascending order
fn generated_versions() -> Vec<AsdfVersion> {
    COMPONENTS
        .iter()
        .flat_map(|&major| {
            COMPONENTS.iter().flat_map(move |&minor| {
                COMPONENTS
                    .iter()
                    .map(move |&patch| AsdfVersion::new(major, minor, patch))
            })
        })
        .collect()
}

#[test]
fn generated_versions_survive_display_and_parse() {
    for version in generated_versions() {
        let text = version.to_string();
        let (major, minor, patch) = version.as_tuple();

        assert_eq!(text, format!("{major}.{minor}.{patch}"));
        assert_eq!(AsdfVersion::parse(&text), Ok(version), "{text}");
    }
}

#[test]
fn exactly_one_of_less_equal_greater_holds() {
    let versions = generated_versions();

    for x in &versions {
        for y in &versions {
            let holds = [x < y, x == y, x > y];
            assert_eq!(
                holds.iter().filter(|h| **h).count(),
                1,
                "{x} vs {y}: {holds:?}"
            );

            let text = y.to_string();
            assert_eq!(
                [x < &text, x == &text, x > &text],
                holds,
                "{x} vs \"{text}\""
            );
        }
    }
}

#[test]
fn less_than_is_transitive_along_generated_chain() {
    let versions = generated_versions();

    for (i, x) in versions.iter().enumerate() {
        for y in &versions[i + 1..] {
            assert!(x < y, "{x} < {y}");
        }
    }

    let sample: Vec<AsdfVersion> = versions.iter().step_by(5).copied().collect();
    for a in &sample {
        for b in &sample {
            for c in &sample {
                if a < b && b < c {
                    assert!(a < c, "{a} < {b} < {c}");
                }
            }
        }
    }
}

#[rstest]
#[case("1.0.0", true, false)]
#[case("1.0.1", true, false)]
#[case("1.1.0", true, false)]
#[case("1.1.1", true, false)]
#[case("2.0.0", false, false)]
#[case("2.0.1", false, true)]
#[case("2.1.0", false, true)]
#[case("2.1.1", false, true)]
fn version_orders_against_strings(#[case] other: &str, #[case] greater: bool, #[case] less: bool) {
    let version = v("2.0.0");

    assert_eq!(version > other, greater);
    assert_eq!(version < other, less);
    assert_eq!(version >= other, !less);
    assert_eq!(version <= other, !greater);

    assert_eq!(other < version, greater);
    assert_eq!(other > version, less);
    assert_eq!(other <= version, !less);
    assert_eq!(other >= version, !greater);
}

#[rstest]
#[case((1, 0, 0), true, false)]
#[case((1, 0, 1), true, false)]
#[case((1, 1, 0), true, false)]
#[case((1, 1, 1), true, false)]
#[case((2, 0, 0), false, false)]
#[case((2, 0, 1), false, true)]
#[case((2, 1, 0), false, true)]
#[case((2, 1, 1), false, true)]
fn version_orders_against_tuples(
    #[case] other: (u64, u64, u64),
    #[case] greater: bool,
    #[case] less: bool,
) {
    let version = v("2.0.0");

    assert_eq!(version > other, greater);
    assert_eq!(version < other, less);
    assert_eq!(version >= other, !less);
    assert_eq!(version <= other, !greater);

    assert_eq!(other < version, greater);
    assert_eq!(other > version, less);
    assert_eq!(other <= version, !less);
    assert_eq!(other >= version, !greater);
}

#[test]
fn unparsable_strings_are_unequal_and_unordered() {
    let version = v("1.0.0");

    assert!(version != "1.0");
    assert!("banana" != version);
    assert_eq!(version.partial_cmp("1.0"), None);
    assert!(!(version < "1.0") && !(version > "1.0"));
}

#[test]
fn spec_matches_versions_strings_and_tuples() {
    let spec = AsdfSpec::parse(">=1.1.0").unwrap();

    assert!(spec.matches(&v("1.1.0")));
    assert!(spec.matches(&v("1.2.0")));
    assert!(!spec.matches(&v("1.0.0")));
    assert!(!spec.matches(&v("1.0.9")));

    assert!(spec.matches("1.1.0"));
    assert!(spec.matches("1.2.0"));
    assert!(!spec.matches("1.0.0"));
    assert!(!spec.matches("1.0.9"));

    assert!(spec.matches(&(1_u64, 1, 0)));
    assert!(spec.matches(&(1_u64, 2, 0)));
    assert!(!spec.matches(&(1_u64, 0, 0)));
    assert!(!spec.matches(&(1_u64, 0, 9)));
}

#[test]
fn spec_selects_greatest_match_from_versions() {
    let spec = AsdfSpec::parse(">=1.1.0").unwrap();
    let versions: Vec<AsdfVersion> = ["1.0.0", "1.0.9", "1.1.0", "1.2.0"].into_iter().map(v).collect();

    assert_eq!(spec.select(versions.iter().copied()), Some(v("1.2.0")));
    assert_eq!(spec.select(versions[..3].iter().copied()), Some(v("1.1.0")));
    assert_eq!(spec.select(versions[..2].iter().copied()), None);
}

#[test]
fn spec_selects_greatest_match_from_strings() {
    let spec = AsdfSpec::parse(">=1.1.0").unwrap();
    let versions = ["1.0.0", "1.0.9", "1.1.0", "1.2.0"];

    assert_eq!(spec.select(versions), Some("1.2.0"));
    assert_eq!(spec.select(&versions[..3]), Some(&"1.1.0"));
    assert_eq!(spec.select(&versions[..2]), None);
}

#[test]
fn spec_selects_greatest_match_from_tuples() {
    let spec = AsdfSpec::parse(">=1.1.0").unwrap();
    let versions: [(u64, u64, u64); 4] = [(1, 0, 0), (1, 0, 9), (1, 1, 0), (1, 2, 0)];

    let best = spec.select(versions).unwrap();
    assert!(best == v("1.2.0"));
    assert_eq!(spec.select(&versions[..3]).copied(), Some((1, 1, 0)));
    assert_eq!(spec.select(&versions[..2]), None);
}

#[test]
fn spec_select_is_independent_of_input_order() {
    let spec = AsdfSpec::parse(">=1.1.0").unwrap();

    assert_eq!(spec.select(["1.2.0", "1.0.0", "1.1.0"]), Some("1.2.0"));
    assert_eq!(spec.select(["1.1.0", "1.2.0", "1.0.9"]), Some("1.2.0"));
}

#[test]
fn spec_filter_keeps_input_order() {
    let spec = AsdfSpec::parse(">=1.1.0").unwrap();
    let strings = ["1.0.0", "1.0.9", "1.1.0", "1.2.0"];
    let tuples: [(u64, u64, u64); 4] = [(1, 0, 0), (1, 0, 9), (1, 1, 0), (1, 2, 0)];
    let versions: Vec<AsdfVersion> = strings.into_iter().map(v).collect();

    let from_strings: Vec<&str> = spec.filter(strings).collect();
    let from_tuples: Vec<(u64, u64, u64)> = spec.filter(tuples).collect();
    let from_versions: Vec<AsdfVersion> = spec.filter(versions).collect();

    assert_eq!(from_strings, vec!["1.1.0", "1.2.0"]);
    assert_eq!(from_tuples, vec![(1, 1, 0), (1, 2, 0)]);
    assert_eq!(from_versions, vec![v("1.1.0"), v("1.2.0")]);
}

#[test]
fn spec_filter_can_be_replayed() {
    let spec = AsdfSpec::parse("<1.1.0").unwrap();
    let versions = ["1.0.0", "1.1.0", "1.0.9"];
    let filter = spec.filter(&versions);

    let first: Vec<_> = filter.clone().collect();
    let second: Vec<_> = filter.collect();

    assert_eq!(first, vec![&"1.0.0", &"1.0.9"]);
    assert_eq!(first, second);
}

#[test]
fn spec_equality_means_match() {
    let spec = AsdfSpec::parse(">=1.2.0").unwrap();
    let older = v("1.1.0");
    let newer = v("1.3.0");

    assert!(spec != older);
    assert!(older != spec);
    assert!(spec == newer);
    assert!(newer == spec);

    assert!(spec != "1.1.0");
    assert!("1.1.0" != spec);
    assert!(spec == "1.3.0");
    assert!("1.3.0" == spec);

    assert!(spec != (1_u64, 1, 0));
    assert!((1_u64, 1, 0) != spec);
    assert!(spec == (1_u64, 3, 0));
    assert!((1_u64, 3, 0) == spec);
}

#[rstest]
#[case("==1.0.0", "1.0.0", true)]
#[case("1.0.0", "1.0.0", true)]
#[case("!=1.0.0", "1.0.0", false)]
#[case("<2.0.0", "1.9.9", true)]
#[case("<=2.0.0", "2.0.0", true)]
#[case(">1.0.0", "1.0.0", false)]
#[case(">= 1.0.0", "1.0.1", true)]
fn spec_comparators(#[case] spec: &str, #[case] version: &str, #[case] expected: bool) {
    assert_eq!(AsdfSpec::parse(spec).unwrap().matches(version), expected);
}
