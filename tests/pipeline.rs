mod common;

use common::{FakeSessionFactory, FakeSite, Script, ScriptedAdapter, lexicon};
use posting_crawler::{
    C40Client, C40CrawlConfig, CrawlError, CrawlPipeline, DevelopmentAidClient,
    DevelopmentAidCrawlConfig, EstmClient, EstmCrawlConfig, SourceOutcome,
};
use std::sync::Arc;

fn sources_of(output: &posting_crawler::CrawlOutput) -> Vec<&str> {
    output.postings.iter().map(|p| p.source.as_str()).collect()
}

#[test]
fn failing_source_contributes_nothing_and_others_survive() {
    let pipeline = CrawlPipeline::new()
        .with_source(ScriptedAdapter {
            name: "Broken",
            script: Script::Fail,
        })
        .with_source(ScriptedAdapter::rows("Alpha", vec!["Climate Lead", "Data Officer"]))
        .with_source(ScriptedAdapter::rows("Beta", vec!["Gender Study"]));

    let output = pipeline.run().unwrap();

    assert_eq!(sources_of(&output), ["Alpha", "Alpha", "Beta"]);
    assert!(output.outcomes[0].is_failure());
    assert_eq!(output.outcomes[0].source(), "Broken");
    assert_eq!(
        output.outcomes[1],
        SourceOutcome::Collected {
            source: "Alpha".into(),
            rows: 2
        }
    );
}

#[test]
fn panicking_source_is_contained() {
    let pipeline = CrawlPipeline::new()
        .with_source(ScriptedAdapter::rows("Alpha", vec!["Climate Lead"]))
        .with_source(ScriptedAdapter {
            name: "Exploding",
            script: Script::Panic,
        })
        .with_source(ScriptedAdapter::rows("Beta", vec!["Gender Study"]));

    let output = pipeline.run().unwrap();

    assert_eq!(sources_of(&output), ["Alpha", "Beta"]);
    match &output.outcomes[1] {
        SourceOutcome::Failed { source, error } => {
            assert_eq!(source, "Exploding");
            assert!(error.contains("markup changed under Exploding"));
        }
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[test]
fn empty_source_name_is_rejected() {
    let output = CrawlPipeline::new()
        .with_source(ScriptedAdapter::rows("", vec!["Nameless"]))
        .with_source(ScriptedAdapter::rows("Alpha", vec!["Climate Lead"]))
        .run()
        .unwrap();

    assert_eq!(sources_of(&output), ["Alpha"]);
    assert!(output.outcomes[0].is_failure());
}

#[test]
fn empty_and_failed_sources_mean_no_data() {
    let result = CrawlPipeline::new()
        .with_source(ScriptedAdapter::rows("Alpha", vec![]))
        .with_source(ScriptedAdapter {
            name: "Broken",
            script: Script::Fail,
        })
        .run();

    assert!(matches!(result, Err(CrawlError::NoDataCollected)));
}

#[test]
fn no_sources_means_no_data() {
    assert!(matches!(
        CrawlPipeline::new().run(),
        Err(CrawlError::NoDataCollected)
    ));
}

#[test]
fn parallel_run_keeps_source_order() {
    let pipeline = CrawlPipeline::new()
        .with_source(ScriptedAdapter::rows("Alpha", vec!["a1", "a2"]))
        .with_source(ScriptedAdapter {
            name: "Exploding",
            script: Script::Panic,
        })
        .with_source(ScriptedAdapter::rows("Beta", vec!["b1"]))
        .with_source(ScriptedAdapter::rows("Gamma", vec!["g1"]));

    let output = pipeline.run_parallel(4).unwrap();

    let titles: Vec<_> = output.postings.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["a1", "a2", "b1", "g1"]);
    let order: Vec<_> = output.outcomes.iter().map(SourceOutcome::source).collect();
    assert_eq!(order, ["Alpha", "Exploding", "Beta", "Gamma"]);
}

const C40_LISTING: &str = r#"
<html><body>
  <a href="/careers/1">Urban Climate Lead</a>
  <a href="/careers/2">Finance Officer</a>
</body></html>
"#;

const ESTM_LISTING: &str = r#"
<html><body>
  <div class="job-grid-item">
    <a href="/jobs/7"><span class="job-tile__title">Energy Auditor</span></a>
  </div>
</body></html>
"#;

const ESTM_DETAIL: &str = r#"
<html><body><div class="job-details__info-section">
  <span>Apply Before</span><span>01/07/2025</span>
</div></body></html>
"#;

const TENDERS: &str = r#"
<html><body>
  <div class="search-card">
    <a class="search-card__title" href="/tenders/5" title="Heat Action Plan">Heat</a>
  </div>
</body></html>
"#;

#[test]
fn browser_failure_in_one_adapter_leaves_the_rest_of_the_run_intact() {
    let site = FakeSite::new()
        .page("https://c40.bamboohr.com/careers", C40_LISTING)
        .page(
            "https://c40.bamboohr.com/careers/1",
            r#"<div class="BambooRichText"><p>Details</p></div>"#,
        )
        // third page load of the C40 crawl
        .broken("https://c40.bamboohr.com/careers/2")
        .page("https://estm.example/jobs", ESTM_LISTING)
        .page("https://estm.example/jobs/7", ESTM_DETAIL)
        .page("https://tenders.example/search", TENDERS);
    let sessions = FakeSessionFactory::new(site);
    let lexicon = lexicon();

    let pipeline = CrawlPipeline::new()
        .with_source(C40Client::new(
            C40CrawlConfig::default(),
            lexicon.clone(),
            Arc::new(sessions.clone()),
        ))
        .with_source(EstmClient::new(
            EstmCrawlConfig {
                jobs_url: "https://estm.example/jobs".into(),
                base_url: "https://estm.example".into(),
                ..Default::default()
            },
            lexicon.clone(),
            Arc::new(sessions.clone()),
        ))
        .with_source(DevelopmentAidClient::new(
            DevelopmentAidCrawlConfig {
                search_url: "https://tenders.example/search".into(),
                base_url: "https://tenders.example".into(),
                ..Default::default()
            },
            lexicon,
            Arc::new(sessions.clone()),
        ));

    let output = pipeline.run().unwrap();

    assert_eq!(sources_of(&output), ["ESTM", "DevelopmentAid"]);
    assert!(output.outcomes[0].is_failure());

    let estm = &output.postings[0];
    assert_eq!(estm.title, "Energy Auditor");
    assert_eq!(estm.matched_vertical.as_deref(), Some("Climate"));
    assert_eq!(estm.deadline_or_posting_date.as_deref(), Some("01/07/2025"));
    assert_eq!(estm.apply_link.as_deref(), Some("https://estm.example/jobs/7"));

    let tender = &output.postings[1];
    assert_eq!(tender.title, "Heat Action Plan");
    assert_eq!(tender.description, None);

    // every session opened during the run was released
    assert_eq!(sessions.opened(), 3);
    assert_eq!(sessions.closed(), 3);
}

#[test]
fn combined_file_has_fixed_header_and_hyperlinked_apply_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output").join("Combined.csv");

    let output = CrawlPipeline::new()
        .with_source(ScriptedAdapter::rows("Alpha", vec!["Say \"hi\" Lead"]))
        .run()
        .unwrap();
    output.save(&path).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].iter().collect::<Vec<_>>(),
        [
            "Source",
            "Title",
            "Description",
            "Matched_Vertical",
            "Deadline_or_PostingDate",
            "Apply_Link"
        ]
    );

    let row = &records[1];
    assert_eq!(&row[0], "Alpha");
    assert_eq!(&row[1], "Say \"hi\" Lead");
    assert_eq!(&row[2], "");
    assert_eq!(&row[3], "N/A");
    assert_eq!(&row[4], "");
    assert_eq!(
        &row[5],
        r#"=HYPERLINK("https://Alpha.example/Say-""hi""-Lead", "Apply")"#
    );
}
