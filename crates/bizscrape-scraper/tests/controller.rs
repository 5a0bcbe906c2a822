//! Controller runs against in-memory browser and store fakes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bizscrape_core::{
    parse_selectors, BusinessRecord, ExtractedContact, ExtractedFaq, ExtractedService,
    SelectorConfig, NOT_FOUND, NO_ANSWER_FOUND,
};
use bizscrape_scraper::{
    BrowserLauncher, BrowserSession, BusinessStore, Controller, ControllerSettings, PageQuery,
    PipelineSettings, ProfileSink, RetryPolicy, ScrapeError, ScraperError, StoreError,
};

const HOME: &str = "https://brightsmiles.example";
const FAQ: &str = "https://brightsmiles.example/faq";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Nav {
    Ok,
    Fail,
    Hang,
}

#[derive(Default)]
struct Site {
    pages: HashMap<&'static str, Nav>,
    texts: HashMap<&'static str, Vec<String>>,
    hung_queries: HashSet<&'static str>,
    visits: Mutex<Vec<String>>,
}

impl Site {
    fn page(mut self, url: &'static str, nav: Nav) -> Self {
        self.pages.insert(url, nav);
        self
    }

    fn text(mut self, selector: &'static str, texts: &[&str]) -> Self {
        self.texts
            .insert(selector, texts.iter().map(|t| (*t).to_string()).collect());
        self
    }

    fn hang_query(mut self, selector: &'static str) -> Self {
        self.hung_queries.insert(selector);
        self
    }

    fn visits(&self, url: &str) -> usize {
        self.visits.lock().unwrap().iter().filter(|v| *v == url).count()
    }
}

struct FakeSession {
    site: Arc<Site>,
    released: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

#[async_trait]
impl PageQuery for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.site.visits.lock().unwrap().push(url.to_string());
        match self.site.pages.get(url).copied().unwrap_or(Nav::Fail) {
            Nav::Ok => Ok(()),
            Nav::Fail => Err(ScraperError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            }),
            Nav::Hang => std::future::pending().await,
        }
    }

    async fn query_text(&self, selector: &str) -> Result<Vec<String>, ScraperError> {
        if self.site.hung_queries.contains(selector) {
            return std::future::pending().await;
        }
        Ok(self.site.texts.get(selector).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn release(self: Box<Self>) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

struct FakeLauncher {
    site: Arc<Site>,
    fail_launch: bool,
    launches: AtomicU32,
    released: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl FakeLauncher {
    fn new(site: Site) -> Self {
        Self {
            site: Arc::new(site),
            fail_launch: false,
            launches: AtomicU32::new(0),
            released: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(ScraperError::BrowserLaunch("no display".to_string()));
        }
        Ok(Box::new(FakeSession {
            site: Arc::clone(&self.site),
            released: Arc::clone(&self.released),
            dropped: Arc::clone(&self.dropped),
        }))
    }
}

struct FakeStore {
    businesses: HashMap<String, BusinessRecord>,
    selectors: HashMap<String, SelectorConfig>,
}

#[async_trait]
impl BusinessStore for FakeStore {
    async fn business(&self, business_id: &str) -> Result<Option<BusinessRecord>, StoreError> {
        Ok(self.businesses.get(business_id).cloned())
    }

    async fn selectors(&self, business_id: &str) -> Result<Option<SelectorConfig>, StoreError> {
        Ok(self.selectors.get(business_id).cloned())
    }
}

#[derive(Default)]
struct FakeSink {
    writes: Mutex<Vec<String>>,
    fail_contact: bool,
    faqs: Mutex<Vec<ExtractedFaq>>,
    contact: Mutex<Option<ExtractedContact>>,
}

impl FakeSink {
    fn writes(&self) -> Vec<String> {
        let mut writes = self.writes.lock().unwrap().clone();
        writes.sort();
        writes
    }

    fn log(&self, entity: &str, business_id: &str) {
        self.writes
            .lock()
            .unwrap()
            .push(format!("{entity}:{business_id}"));
    }
}

#[async_trait]
impl ProfileSink for FakeSink {
    async fn upsert_business(
        &self,
        business_id: &str,
        _about: Option<&str>,
    ) -> Result<(), StoreError> {
        self.log("business", business_id);
        Ok(())
    }

    async fn replace_services(
        &self,
        business_id: &str,
        services: &[ExtractedService],
    ) -> Result<usize, StoreError> {
        self.log("services", business_id);
        Ok(services.len())
    }

    async fn replace_contact(
        &self,
        business_id: &str,
        contact: &ExtractedContact,
    ) -> Result<(), StoreError> {
        self.log("contact", business_id);
        if self.fail_contact {
            return Err(StoreError::Other("connection reset".to_string()));
        }
        *self.contact.lock().unwrap() = Some(contact.clone());
        Ok(())
    }

    async fn replace_faqs(
        &self,
        business_id: &str,
        faqs: &[ExtractedFaq],
    ) -> Result<usize, StoreError> {
        self.log("faqs", business_id);
        *self.faqs.lock().unwrap() = faqs.to_vec();
        Ok(faqs.len())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn store(with_selectors: bool) -> FakeStore {
    let business = BusinessRecord {
        business_id: "bright-smiles".to_string(),
        name: "Bright Smiles Dental".to_string(),
        url: format!("{HOME}/"),
    };
    let file = parse_selectors(
        r#"
selectors:
  - business_id: bright-smiles
    service_selector: ".services li"
    contact_selector:
      phone: ".phone"
      email: ".email"
    faqs_selector:
      question: ".faq dt"
      answer: ".faq dd"
"#,
    )
    .unwrap();

    let mut selectors = HashMap::new();
    if with_selectors {
        selectors.insert(
            "bright-smiles".to_string(),
            file.find("bright-smiles").unwrap().clone(),
        );
    }

    FakeStore {
        businesses: HashMap::from([("bright-smiles".to_string(), business)]),
        selectors,
    }
}

fn settings() -> ControllerSettings {
    ControllerSettings {
        pipeline: PipelineSettings {
            retry: RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(2_000),
                attempt_timeout: Duration::from_millis(60_000),
            },
            settle_delay: Duration::from_millis(3_000),
        },
        budget: Duration::from_millis(600_000),
    }
}

fn healthy_site() -> Site {
    Site::default()
        .page(HOME, Nav::Ok)
        .page(FAQ, Nav::Ok)
        .text(".services li", &["Cleaning", "Dr. Smith", "Ab", "Whitening"])
        .text(".phone", &["(555) 010-2000"])
        .text(".email", &["hello@brightsmiles.example"])
        .text(".faq dt", &["Q1?", "Q2?", "Q3?"])
        .text(".faq dd", &["A1", "A2"])
}

fn controller(
    launcher: &Arc<FakeLauncher>,
    store: FakeStore,
    sink: &Arc<FakeSink>,
    settings: ControllerSettings,
) -> Controller {
    Controller::new(
        Arc::clone(launcher) as Arc<dyn BrowserLauncher>,
        Arc::new(store),
        Arc::clone(sink) as Arc<dyn ProfileSink>,
        settings,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn successful_run_persists_all_four_entities() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let report = controller.run("bright-smiles").await.unwrap();

    assert_eq!(report.business_id, "bright-smiles");
    assert_eq!(report.services, 2);
    assert_eq!(report.faqs, 3);
    assert!(report.contact_found);
    assert!(report.outcome.is_complete());
    assert_eq!(
        sink.writes(),
        vec![
            "business:bright-smiles",
            "contact:bright-smiles",
            "faqs:bright-smiles",
            "services:bright-smiles",
        ]
    );

    let faqs = sink.faqs.lock().unwrap().clone();
    assert_eq!(faqs[2].answer, NO_ANSWER_FOUND);
    assert!(launcher.released.load(Ordering::SeqCst));
    assert!(!controller.locks().is_running("bright-smiles"));
}

#[tokio::test(start_paused = true)]
async fn missing_selector_config_never_launches_browser() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(false), &sink, settings());

    let err = controller.run("bright-smiles").await.unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::ConfigMissing {
            what: "selector config",
            ..
        }
    ));
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    assert!(sink.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_business_is_config_missing() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let err = controller.run("nobody").await.unwrap_err();

    assert!(matches!(err, ScrapeError::ConfigMissing { .. }));
    assert_eq!(err.business_id(), "nobody");
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn hung_home_navigation_fails_without_writes() {
    let site = Site::default().page(HOME, Nav::Hang).page(FAQ, Nav::Ok);
    let launcher = Arc::new(FakeLauncher::new(site));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let err = controller.run("bright-smiles").await.unwrap_err();

    match err {
        ScrapeError::Failed { source, .. } => {
            assert!(matches!(source, ScraperError::NavigationTimeout { .. }));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(sink.writes().is_empty());
    assert!(launcher.released.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn budget_expiry_is_fatal_and_drops_session() {
    let site = healthy_site().hang_query(".services li");
    let launcher = Arc::new(FakeLauncher::new(site));
    let sink = Arc::new(FakeSink::default());
    let mut settings = settings();
    settings.budget = Duration::from_millis(300_000);
    let controller = controller(&launcher, store(true), &sink, settings);

    let err = controller.run("bright-smiles").await.unwrap_err();

    match err {
        ScrapeError::Failed { source, .. } => {
            assert!(matches!(
                source,
                ScraperError::DeadlineExceeded { budget_ms: 300_000 }
            ));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(sink.writes().is_empty());
    assert!(!launcher.released.load(Ordering::SeqCst));
    assert!(launcher.dropped.load(Ordering::SeqCst));
    assert!(!controller.locks().is_running("bright-smiles"));
}

#[tokio::test(start_paused = true)]
async fn hung_faq_page_under_default_budget_still_persists_home_content() {
    let site = healthy_site().page(FAQ, Nav::Hang);
    let launcher = Arc::new(FakeLauncher::new(site));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, ControllerSettings::default());

    let report = controller.run("bright-smiles").await.unwrap();

    assert_eq!(report.services, 2);
    assert_eq!(report.faqs, 0);
    assert!(report.contact_found);
    assert_eq!(sink.writes().len(), 4);
    assert!(sink.faqs.lock().unwrap().is_empty());
    assert!(launcher.released.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn hung_home_page_under_default_budget_exhausts_retries() {
    let site = Site::default().page(HOME, Nav::Hang).page(FAQ, Nav::Ok);
    let launcher = Arc::new(FakeLauncher::new(site));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, ControllerSettings::default());

    let err = controller.run("bright-smiles").await.unwrap_err();

    match err {
        ScrapeError::Failed { source, .. } => {
            assert!(matches!(source, ScraperError::NavigationTimeout { .. }));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(launcher.site.visits(HOME), 3);
    assert_eq!(launcher.site.visits(FAQ), 0);
    assert!(sink.writes().is_empty());
    assert!(launcher.released.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn default_settings_complete_a_healthy_run() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, ControllerSettings::default());

    let report = controller.run("bright-smiles").await.unwrap();

    assert_eq!(report.faqs, 3);
    assert_eq!(launcher.site.visits(FAQ), 1);
}

#[tokio::test(start_paused = true)]
async fn faq_page_failure_still_persists() {
    let site = healthy_site().page(FAQ, Nav::Fail);
    let launcher = Arc::new(FakeLauncher::new(site));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let report = controller.run("bright-smiles").await.unwrap();

    assert_eq!(report.faqs, 0);
    assert_eq!(sink.writes().len(), 4);
    assert!(sink.faqs.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn no_contact_match_persists_sentinels() {
    let site = Site::default()
        .page(HOME, Nav::Ok)
        .page(FAQ, Nav::Ok)
        .text(".services li", &["Cleaning"]);
    let launcher = Arc::new(FakeLauncher::new(site));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let report = controller.run("bright-smiles").await.unwrap();

    assert!(!report.contact_found);
    let contact = sink.contact.lock().unwrap().clone().unwrap();
    assert_eq!(contact.phone, NOT_FOUND);
    assert_eq!(contact.email, NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn browser_launch_failure_is_fatal() {
    let mut launcher = FakeLauncher::new(healthy_site());
    launcher.fail_launch = true;
    let launcher = Arc::new(launcher);
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let err = controller.run("bright-smiles").await.unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Failed {
            source: ScraperError::BrowserLaunch(_),
            ..
        }
    ));
    assert!(sink.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn persistence_failure_reports_failed_entity() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink {
        fail_contact: true,
        ..FakeSink::default()
    });
    let controller = controller(&launcher, store(true), &sink, settings());

    let err = controller.run("bright-smiles").await.unwrap_err();

    match err {
        ScrapeError::Persistence(outcome) => {
            assert_eq!(outcome.failed_entities(), vec!["contact"]);
        }
        other => panic!("expected Persistence, got {other:?}"),
    }
    assert_eq!(sink.writes().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_for_same_business_is_rejected() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let _held = controller.locks().try_acquire("bright-smiles").unwrap();
    let err = controller.run("bright-smiles").await.unwrap_err();

    assert!(matches!(err, ScrapeError::AlreadyRunning { .. }));
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn preview_extracts_without_writing() {
    let launcher = Arc::new(FakeLauncher::new(healthy_site()));
    let sink = Arc::new(FakeSink::default());
    let controller = controller(&launcher, store(true), &sink, settings());

    let preview = controller.preview("bright-smiles").await.unwrap();

    assert_eq!(preview.result.services.len(), 2);
    assert!(preview.validation.phone_valid);
    assert!(preview.validation.email_valid);
    assert!(sink.writes().is_empty());
}
