// wfc-rules/tests/catalog_tests.rs
use proptest::prelude::*;
use wfc_rules::{
    AdjacencyRules, CatalogOptions, Category, Direction, Pattern, PatternCatalog, SampleGrid,
    SymmetryMap, SymmetryTable,
};

// A rotate map of order 4 over 8 categories: two 4-cycles.
fn order_four_map() -> SymmetryMap {
    let sample = SampleGrid::from_rows(&["abcdefgh"]).unwrap();
    let table = SymmetryTable::from_chars(
        &[
            ('a', 'b'),
            ('b', 'c'),
            ('c', 'd'),
            ('d', 'a'),
            ('e', 'f'),
            ('f', 'g'),
            ('g', 'h'),
            ('h', 'e'),
        ],
        &[],
    );
    PatternCatalog::from_sources(
        &[&sample],
        &table,
        CatalogOptions {
            pattern_size: 1,
            periodic_input: false,
            symmetry: 1,
        },
    )
    .unwrap()
    .symmetry()
    .clone()
}

fn arb_pattern(max_size: usize, categories: u16) -> impl Strategy<Value = Pattern> {
    (1..=max_size).prop_flat_map(move |size| {
        prop::collection::vec(0..categories, size * size).prop_map(move |cells| {
            Pattern::from_fn(size, |x, y| Category(cells[x + y * size]))
        })
    })
}

proptest! {
    #[test]
    fn four_rotations_restore_pattern(pattern in arb_pattern(4, 8)) {
        let map = order_four_map();
        let rotated = pattern
            .rotated(&map)
            .rotated(&map)
            .rotated(&map)
            .rotated(&map);
        prop_assert_eq!(rotated, pattern);
    }

    #[test]
    fn propagator_is_pure(patterns in prop::collection::vec(arb_pattern(1, 3), 1..6)) {
        // Fixed-size patterns; reuse the generated cells at N = 2.
        let patterns: Vec<Pattern> = patterns
            .iter()
            .enumerate()
            .map(|(i, p)| Pattern::from_fn(2, |x, y| Category((p.get(0, 0).0 + (x + y + i) as u16) % 3)))
            .collect();
        let first = AdjacencyRules::build(&patterns);
        let second = AdjacencyRules::build(&patterns);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn multiple_samples_share_one_dictionary() {
    let a = SampleGrid::from_rows(&["ab", "ba"]).unwrap();
    let b = SampleGrid::from_rows(&["cc", "cc"]).unwrap();
    let catalog = PatternCatalog::from_sources(
        &[&a, &b],
        &SymmetryTable::identity(),
        CatalogOptions {
            pattern_size: 2,
            periodic_input: true,
            symmetry: 1,
        },
    )
    .unwrap();

    assert_eq!(catalog.dictionary().len(), 3);
    // "ab/ba" on a 2x2 torus has two windows, "cc/cc" contributes one (weight 4).
    assert_eq!(catalog.len(), 3);
    let weights = catalog.weights();
    assert!((weights[2] - 4.0).abs() < f64::EPSILON);
}

#[test]
fn catalog_patterns_self_overlap_consistently() {
    let sample = SampleGrid::from_rows(&["..#", ".##", "###"]).unwrap();
    let catalog = PatternCatalog::from_sources(
        &[&sample],
        &SymmetryTable::identity(),
        CatalogOptions {
            pattern_size: 2,
            periodic_input: false,
            symmetry: 1,
        },
    )
    .unwrap();
    let rules = AdjacencyRules::build(catalog.patterns());

    // Anchors that neighbour each other in the sample must be compatible.
    let find = |x: usize, y: usize| {
        let p = Pattern::from_fn(2, |dx, dy| {
            let tile = ["..#", ".##", "###"][y + dy].as_bytes()[x + dx] as char;
            catalog
                .dictionary()
                .category(wfc_rules::TileId::from_char(tile))
                .unwrap()
        });
        catalog.patterns().iter().position(|q| *q == p).unwrap()
    };
    assert!(rules.check(find(0, 0), find(1, 0), Direction::East));
    assert!(rules.check(find(0, 0), find(0, 1), Direction::South));
    assert!(rules.check(find(1, 1), find(0, 1), Direction::West));
}
