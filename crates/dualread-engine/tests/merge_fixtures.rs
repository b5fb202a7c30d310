use dualread_engine::{DualRead, FileFetcher, Merger, Route, Settings, segment};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixtures_dir() -> String {
    format!("{}/tests/fixtures", env!("CARGO_MANIFEST_DIR"))
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("{}/{name}", fixtures_dir())).unwrap()
}

#[rstest]
#[case("spring_dawn", 3, 0)]
#[case("crlf", 3, 2)]
fn fixture_merges_to_expected(#[case] name: &str, #[case] wrapped: usize, #[case] unused: usize) {
    let document = read_fixture(&format!("{name}.md"));
    let annotation = read_fixture(&format!("{name}_en.md"));
    let expected = read_fixture(&format!("{name}.expected.md"));

    let outcome = Merger::default().merge(&document, &annotation).unwrap();

    assert_eq!(outcome.content, expected);
    assert_eq!(outcome.wrapped, wrapped);
    assert_eq!(outcome.unused, unused);
}

#[rstest]
#[case("spring_dawn.md")]
#[case("spring_dawn_en.md")]
#[case("spring_dawn.expected.md")]
#[case("crlf.md")]
fn fixtures_reconstruct_exactly(#[case] name: &str) {
    let document = read_fixture(name);
    let segments = segment::segment_exact(&document);
    assert_eq!(segment::reassemble(&segments), document);
}

#[test]
fn remerge_only_touches_unwrapped_prose() {
    let document = read_fixture("spring_dawn.md");
    let annotation = read_fixture("spring_dawn_en.md");

    let once = Merger::default().merge(&document, &annotation).unwrap();
    let twice = Merger::default().merge(&once.content, &annotation).unwrap();

    assert_eq!(twice.wrapped, 1);
    assert_eq!(twice.unused, 2);
    assert_eq!(once.content.matches("<ruby>").count(), 4);
    assert_eq!(twice.content.matches("<ruby>").count(), 5);
    assert!(
        twice
            .content
            .ends_with("<ruby>最后一段没有注释。<rt>Meng Haoran</rt></ruby>\n")
    );
}

#[tokio::test]
async fn file_fetcher_pipeline_end_to_end() {
    let dual = DualRead::with_fetcher(&Settings::default(), FileFetcher::new(fixtures_dir()));
    let document = read_fixture("spring_dawn.md");

    let out = dual
        .before_parse(&document, &Route::new("spring_dawn.md"))
        .await;

    assert_eq!(out, read_fixture("spring_dawn.expected.md"));
}

#[tokio::test]
async fn file_fetcher_pipeline_without_annotation() {
    let dual = DualRead::with_fetcher(&Settings::default(), FileFetcher::new(fixtures_dir()));
    let document = "Lonely paragraph.\n";

    let out = dual.before_parse(document, &Route::new("lonely.md")).await;

    assert_eq!(out, document);
    assert_eq!(dual.cache().stats().failures(), 0);
}
