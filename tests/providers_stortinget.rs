// tests/providers_stortinget.rs
// Stortinget saker export parsing against a captured fixture.

use lovsonar::ingest::providers::stortinget::StortingetProvider;
use lovsonar::ingest::types::SourceProvider;

const SAKER_FIXTURE: &str = include_str!("fixtures/stortinget_saker.json");

#[tokio::test]
async fn saker_fixture_yields_case_items() {
    let provider = StortingetProvider::from_fixture_str(SAKER_FIXTURE);
    let items = provider.fetch_latest().await.expect("parse saker fixture");

    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.source == "Stortinget"));

    let first = &items[0];
    assert!(first.title.contains("produktkontrolloven"));
    assert_eq!(
        first.link,
        "https://www.stortinget.no/no/Saker-og-publikasjoner/Saker/Sak/?p=98765"
    );
    // committee and reference both end up in the scored summary
    assert!(first.summary.contains("Energi- og miljøkomiteen"));
    assert!(first.summary.contains("Prop. 88 L"));

    // case without committee or reference still parses, with an empty summary
    let bare = &items[2];
    assert!(bare.title.contains("statsbudsjettet"));
    assert!(bare.summary.is_empty());
}

#[tokio::test]
async fn invalid_json_is_an_error() {
    let provider = StortingetProvider::from_fixture_str("{ not json");
    assert!(provider.fetch_latest().await.is_err());
}
