//! Lexical-layer properties: word-range stability, primary splitting
//! and logical-line partitioning.

use pysemantic::SourceBuffer;
use pysemantic::text::{CachedLogicalLines, LogicalLineFinder, Worder};
use rstest::rstest;

#[test]
fn test_word_range_stable_for_every_interior_offset() {
    let text = "result = compute_value(argument)\n";
    let buf = SourceBuffer::new(text);
    let worder = Worder::new(&buf);
    let start = text.find("compute_value").unwrap();
    let end = start + "compute_value".len();
    let reference = worder.word_range(start);
    for offset in start..end {
        assert_eq!(
            worder.word_range(offset),
            reference,
            "offset {offset} inside the identifier"
        );
    }
    assert_eq!(buf.slice(reference), "compute_value");
}

#[rstest]
#[case("x = foo.bar.ba", "foo.bar", "ba")]
#[case("value = obj.attr", "obj", "attr")]
#[case("deep.a.b.c", "deep.a.b", "c")]
fn test_split_primary_reconstructs_source(
    #[case] text: &str,
    #[case] prefix: &str,
    #[case] partial: &str,
) {
    let buf = SourceBuffer::new(text);
    let worder = Worder::new(&buf);
    let offset = text.chars().count();
    let (got_prefix, got_partial, partial_start) = worder.split_primary_before(offset);
    assert_eq!(got_prefix, prefix);
    assert_eq!(got_partial, partial);
    // The split round-trips: prefix, the separating dot and the
    // partial word together are exactly the source substring of the
    // primary expression.
    let start = worder.primary_start(offset - 1);
    let substring: String = text.chars().skip(start).take(offset - start).collect();
    assert_eq!(substring, format!("{got_prefix}.{got_partial}"));
    assert_eq!(
        text.chars().skip(partial_start).take(offset - partial_start).collect::<String>(),
        got_partial
    );
}

#[test]
fn test_logical_regions_partition_valid_buffer() {
    let text = concat!(
        "import os\n",
        "\n",
        "def f(a,\n",
        "      b=1):\n",
        "    total = (a +\n",
        "             b)\n",
        "    return total\n",
        "\n",
        "result = f(1,\n",
        "           2)\n",
    );
    let buf = SourceBuffer::new(text);
    let regions = LogicalLineFinder::new(&buf).regions();
    assert_eq!(regions, vec![(1, 1), (3, 4), (5, 6), (7, 7), (9, 10)]);
    // No gaps, no overlaps over the statement lines.
    for line in [1, 3, 4, 5, 6, 7, 9, 10] {
        let containing = regions
            .iter()
            .filter(|(s, e)| *s <= line && line <= *e)
            .count();
        assert_eq!(containing, 1, "line {line}");
    }
    for window in regions.windows(2) {
        assert!(window[0].1 < window[1].0, "regions stay ordered and disjoint");
    }
}

#[test]
fn test_cached_lines_agree_with_exact_pass() {
    let text = "a = 1\nx = f(1,\n      2)\n\ndef g():\n    pass\n";
    let buf = SourceBuffer::new(text);
    let finder = LogicalLineFinder::new(&buf);
    let cached = CachedLogicalLines::new(&buf);
    for line in 1..=buf.line_count() {
        if let Ok(region) = finder.logical_line_in(line) {
            if !buf.line(line).trim().is_empty() {
                assert_eq!(cached.logical_line_in(line), region, "line {line}");
            }
        }
    }
}
