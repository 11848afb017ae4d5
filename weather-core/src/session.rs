//! Search session: the query text plus exactly one display phase.
//!
//! Requests are split into three steps so the session never has to be
//! borrowed across an `.await`:
//!
//! 1. [`Session::submit`] or [`Session::locate`] produce a [`PendingFetch`],
//! 2. [`fetch`] runs it against a [`WeatherProvider`],
//! 3. [`Session::complete`] applies the [`FetchOutcome`].
//!
//! Each pending fetch carries a [`RequestId`]. Only the most recently issued
//! request may change the phase, so a slow location lookup can't overwrite a
//! newer typed search.

use tracing::{debug, info, warn};

use crate::{
    error::{FetchError, ValidationError},
    model::{Coordinates, WeatherQuery, WeatherRecord},
    provider::WeatherProvider,
};

/// Shortest query (after trimming) that may be sent to the provider.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Result(WeatherRecord),
    Error,
}

impl Phase {
    pub fn record(&self) -> Option<&WeatherRecord> {
        match self {
            Self::Result(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// Where a request came from; decides what happens to the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Search,
    Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub id: RequestId,
    pub origin: Origin,
    pub query: WeatherQuery,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub id: RequestId,
    pub origin: Origin,
    pub result: Result<WeatherRecord, FetchError>,
}

#[derive(Debug, Default)]
pub struct Session {
    query: String,
    phase: Phase,
    latest: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// True when either a record or the not-found view is on screen.
    pub fn is_showing_result(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Store the text verbatim. Blank text returns to idle and drops any
    /// request still in flight.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        if self.query.trim().is_empty() {
            self.phase = Phase::Idle;
            self.latest += 1;
        }
    }

    /// Validate the current text and turn it into a by-name request.
    ///
    /// The request carries the text as typed, not trimmed.
    pub fn submit(&mut self) -> Result<PendingFetch, ValidationError> {
        if self.query.trim().chars().count() < MIN_QUERY_LEN {
            return Err(ValidationError::QueryTooShort { min: MIN_QUERY_LEN });
        }

        Ok(self.issue(Origin::Search, WeatherQuery::Name(self.query.clone())))
    }

    pub fn locate(&mut self, coords: Coordinates) -> PendingFetch {
        self.issue(Origin::Location, WeatherQuery::Coordinates(coords))
    }

    fn issue(&mut self, origin: Origin, query: WeatherQuery) -> PendingFetch {
        self.latest += 1;
        PendingFetch { id: RequestId(self.latest), origin, query }
    }

    /// Apply a finished request. Returns `false` if a newer request has been
    /// issued since, in which case nothing changes.
    pub fn complete(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.id != RequestId(self.latest) {
            debug!(id = ?outcome.id, latest = self.latest, "dropping superseded response");
            return false;
        }

        match outcome.result {
            Ok(record) => {
                if outcome.origin == Origin::Location {
                    self.query = record.city.clone();
                }
                self.phase = Phase::Result(record);
            }
            Err(e) => {
                warn!(error = %e, "weather lookup failed");
                self.phase = Phase::Error;
            }
        }
        true
    }
}

/// Run a pending request against the provider.
pub async fn fetch<P>(provider: &P, pending: PendingFetch) -> FetchOutcome
where
    P: WeatherProvider + ?Sized,
{
    info!(id = ?pending.id, query = ?pending.query, "fetching current weather");
    let result = provider.current_weather(&pending.query).await;

    FetchOutcome { id: pending.id, origin: pending.origin, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    fn record(city: &str) -> WeatherRecord {
        WeatherRecord {
            city: city.to_string(),
            country: "GB".to_string(),
            current_date: "Monday, 15 January".to_string(),
            current_time: "7:05 AM".to_string(),
            description: "light rain".to_string(),
            main: "Rain".to_string(),
            temp: 11.73,
            highest_temp: 12.9,
            lowest_temp: 10.36,
            sunrise: "8:00 AM".to_string(),
            sunset: "4:15 PM".to_string(),
            clouds: 75,
            humidity: 81,
            wind: 4.63,
        }
    }

    /// Answers every query with "London", or a 404 when `missing` is set.
    #[derive(Debug, Default)]
    struct FakeProvider {
        missing: bool,
        calls: AtomicUsize,
        last_query: Mutex<Option<WeatherQuery>>,
    }

    impl FakeProvider {
        fn not_found() -> Self {
            Self { missing: true, ..Self::default() }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current_weather(
            &self,
            query: &WeatherQuery,
        ) -> Result<WeatherRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_query.lock() {
                *last = Some(query.clone());
            }
            if self.missing {
                return Err(FetchError::Status { status: 404, body: "city not found".into() });
            }
            Ok(record("London"))
        }
    }

    async fn search(session: &mut Session, provider: &FakeProvider, text: &str) -> bool {
        session.set_query(text);
        let pending = session.submit().expect("valid query");
        let outcome = fetch(provider, pending).await;
        session.complete(outcome)
    }

    #[test]
    fn starts_idle_with_empty_text() {
        let session = Session::new();

        assert_eq!(session.query(), "");
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(!session.is_showing_result());
    }

    #[test]
    fn short_queries_are_rejected_without_a_request() {
        for text in ["", " ", "a", "  a  ", "é", "\tb\n"] {
            let mut session = Session::new();
            session.set_query(text);

            let err = session.submit().unwrap_err();
            assert_eq!(err, ValidationError::QueryTooShort { min: 2 }, "{text:?}");
            assert_eq!(session.phase(), &Phase::Idle);
            assert_eq!(session.query(), text);
        }
    }

    #[tokio::test]
    async fn rejected_submit_leaves_a_shown_result_alone() {
        let provider = FakeProvider::default();
        let mut session = Session::new();
        search(&mut session, &provider, "London").await;

        session.set_query("L");
        assert!(session.submit().is_err());

        assert_eq!(provider.calls(), 1);
        assert_eq!(session.phase().record(), Some(&record("London")));
    }

    #[tokio::test]
    async fn submit_sends_the_text_as_typed() {
        let provider = FakeProvider::default();
        let mut session = Session::new();

        assert!(search(&mut session, &provider, " lon ").await);

        let last = provider.last_query.lock().expect("lock").clone();
        assert_eq!(last, Some(WeatherQuery::Name(" lon ".into())));
        // by-name lookups keep the text the user typed
        assert_eq!(session.query(), " lon ");
        assert_eq!(session.phase().record().map(|r| r.city.as_str()), Some("London"));
    }

    #[tokio::test]
    async fn location_lookup_overwrites_the_query_text() {
        let provider = FakeProvider::default();
        let mut session = Session::new();

        let pending = session.locate(Coordinates::new(51.5, -0.12));
        assert!(session.complete(fetch(&provider, pending).await));

        assert_eq!(session.query(), "London");
        assert!(session.is_showing_result());
        assert_eq!(session.phase().record().map(|r| r.country.as_str()), Some("GB"));
    }

    #[tokio::test]
    async fn not_found_moves_to_error_from_any_phase() {
        let ok = FakeProvider::default();
        let missing = FakeProvider::not_found();

        let mut idle = Session::new();
        search(&mut idle, &missing, "Atlantis").await;
        assert_eq!(idle.phase(), &Phase::Error);

        let mut shown = Session::new();
        search(&mut shown, &ok, "London").await;
        search(&mut shown, &missing, "Atlantis").await;
        assert_eq!(shown.phase(), &Phase::Error);
        assert_eq!(shown.phase().record(), None);

        search(&mut shown, &missing, "Atlantis").await;
        assert!(shown.phase().is_error());
    }

    #[tokio::test]
    async fn clearing_the_text_always_returns_to_idle() {
        let ok = FakeProvider::default();
        let missing = FakeProvider::not_found();

        let mut shown = Session::new();
        search(&mut shown, &ok, "London").await;
        shown.set_query("");
        assert_eq!(shown.phase(), &Phase::Idle);

        let mut failed = Session::new();
        search(&mut failed, &missing, "Atlantis").await;
        failed.set_query("   ");
        assert_eq!(failed.phase(), &Phase::Idle);
        assert!(!failed.is_showing_result());
    }

    #[tokio::test]
    async fn editing_without_submitting_keeps_the_phase() {
        let ok = FakeProvider::default();
        let mut session = Session::new();
        search(&mut session, &ok, "London").await;

        session.set_query("Lond");
        assert!(session.is_showing_result());
        assert_eq!(ok.calls(), 1);
    }

    #[tokio::test]
    async fn repeated_search_yields_the_same_record() {
        let provider = FakeProvider::default();
        let mut session = Session::new();

        search(&mut session, &provider, "London").await;
        let first = session.phase().clone();
        search(&mut session, &provider, "London").await;

        assert_eq!(session.phase(), &first);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn newer_search_wins_over_slow_location_lookup() {
        let provider = FakeProvider::default();
        let mut session = Session::new();

        let located = session.locate(Coordinates::new(51.5, -0.12));
        session.set_query("Paris");
        let searched = session.submit().expect("valid query");

        let search_outcome = FetchOutcome {
            id: searched.id,
            origin: searched.origin,
            result: Ok(record("Paris")),
        };
        assert!(session.complete(search_outcome));

        let late = fetch(&provider, located).await;
        assert!(!session.complete(late));

        assert_eq!(session.query(), "Paris");
        assert_eq!(session.phase().record().map(|r| r.city.as_str()), Some("Paris"));
    }

    #[tokio::test]
    async fn clearing_drops_the_in_flight_request() {
        let provider = FakeProvider::default();
        let mut session = Session::new();

        session.set_query("London");
        let pending = session.submit().expect("valid query");
        session.set_query("");

        assert!(!session.complete(fetch(&provider, pending).await));
        assert_eq!(session.phase(), &Phase::Idle);
    }
}
