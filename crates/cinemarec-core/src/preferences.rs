//! Preferences editor: pick favourite genres, actors, directors and movies plus a
//! minimum rating, then save the whole profile at once.

use crate::error::{ViewError, ViewResult};
use crate::generation::{Generation, Ticket};
use crate::session::Session;
use cinemarec_config::PreferencesConfig;
use cinemarec_models::catalog::image_url;
use cinemarec_models::preferences::{MIN_RATING_CEILING, MIN_RATING_FLOOR};
use cinemarec_models::{CatalogMovie, Department, Genre, Person, PreferenceProfile, TasteCategory};
use cinemarec_services::{CatalogApi, CatalogPage, PreferencesApi, ServiceError};
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PROFILE_IMAGE_WIDTH: u32 = 185;
const RATING_STEP: f64 = 0.5;
/// Consecutive backend pages that may filter down to nothing before a fill gives up.
/// When the provider reports no page count, such a run also ends the catalog.
const MAX_EMPTY_RUN: u32 = 5;

/// One selectable catalog item, whatever its category
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: u64,
    pub label: String,
    pub image_url: Option<String>,
    /// Secondary line, e.g. a release date
    pub detail: Option<String>,
}

impl From<Genre> for CatalogEntry {
    fn from(genre: Genre) -> Self {
        Self {
            id: genre.id,
            label: genre.name,
            image_url: None,
            detail: None,
        }
    }
}

impl From<Person> for CatalogEntry {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            image_url: person.profile_path.as_deref().map(|p| image_url(p, PROFILE_IMAGE_WIDTH)),
            detail: person.known_for_department,
            label: person.name,
        }
    }
}

impl From<CatalogMovie> for CatalogEntry {
    fn from(movie: CatalogMovie) -> Self {
        Self {
            id: movie.id,
            image_url: movie.poster_path.as_deref().map(|p| image_url(p, PROFILE_IMAGE_WIDTH)),
            detail: movie.release_date,
            label: movie.title,
        }
    }
}

/// Client-side pagination over a catalog whose backend pages vary in size.
///
/// Items from successive backend pages are appended into one list and cut into display
/// pages of a fixed size. More backend pages are fetched only when a requested display
/// page reaches past what is loaded. Backend pages are filtered before they arrive, so an
/// empty page says nothing about the end: the catalog is exhausted once the backend's
/// reported page count is reached, or after `MAX_EMPTY_RUN` empty pages in a row when no
/// count is known.
#[derive(Debug, Clone)]
pub struct CatalogWindow {
    items: Vec<CatalogEntry>,
    seen: HashSet<u64>,
    next_backend_page: u32,
    total_pages: Option<u32>,
    empty_run: u32,
    exhausted: bool,
    page_size: usize,
}

impl CatalogWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            next_backend_page: 1,
            total_pages: None,
            empty_run: 0,
            exhausted: false,
            page_size: page_size.max(1),
        }
    }

    /// A window holding a complete list that never needs another fetch
    pub fn complete(page_size: usize, items: Vec<CatalogEntry>) -> Self {
        let mut window = Self::new(page_size);
        window.push_items(items);
        window.exhausted = true;
        window
    }

    fn push_items(&mut self, items: Vec<CatalogEntry>) {
        for item in items {
            if self.seen.insert(item.id) {
                self.items.push(item);
            }
        }
    }

    /// Append one backend page
    pub fn extend(&mut self, page: CatalogPage<CatalogEntry>) {
        let fetched = self.next_backend_page;
        self.next_backend_page += 1;
        if page.total_pages.is_some() {
            self.total_pages = page.total_pages;
        }
        if page.items.is_empty() {
            self.empty_run += 1;
        } else {
            self.empty_run = 0;
            self.push_items(page.items);
        }
        self.exhausted = match self.total_pages {
            Some(total) => fetched >= total,
            None => self.empty_run >= MAX_EMPTY_RUN,
        };
    }

    pub fn needs_more(&self, page: usize) -> bool {
        !self.exhausted && self.items.len() < (page + 1) * self.page_size
    }

    pub fn next_backend_page(&self) -> u32 {
        self.next_backend_page
    }

    /// Display page `page` (0-based); shorter than `page_size` at the end
    pub fn page(&self, page: usize) -> &[CatalogEntry] {
        let start = (page * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        &self.items[start..end]
    }

    /// Whether display page `page` exists or could still be loaded
    pub fn has_page(&self, page: usize) -> bool {
        page * self.page_size < self.items.len() || !self.exhausted
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: u64) -> Option<&CatalogEntry> {
        self.items.iter().find(|e| e.id == id)
    }

    /// Fetch backend pages until display page `page` is filled or the catalog runs out
    pub async fn fill<F, Fut>(&mut self, page: usize, mut fetch: F) -> Result<(), ServiceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<CatalogPage<CatalogEntry>, ServiceError>>,
    {
        let mut empty_pages = 0;
        while self.needs_more(page) && empty_pages < MAX_EMPTY_RUN {
            let backend_page = self.next_backend_page;
            let fetched = fetch(backend_page).await?;
            debug!("Catalog page {} returned {} items", backend_page, fetched.items.len());
            if fetched.items.is_empty() {
                empty_pages += 1;
            } else {
                empty_pages = 0;
            }
            self.extend(fetched);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListMode {
    Popular { page: usize },
    Search { query: String, results: Vec<CatalogEntry> },
}

/// A search started for one category; its results apply only while its ticket is current
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub category: TasteCategory,
    pub query: String,
    ticket: Ticket,
}

struct CategoryPanel {
    window: CatalogWindow,
    mode: ListMode,
    searches: Generation,
}

impl CategoryPanel {
    fn new(window: CatalogWindow) -> Self {
        Self {
            window,
            mode: ListMode::Popular { page: 0 },
            searches: Generation::new(),
        }
    }
}

/// A category whose selection count is below its configured minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub category: TasteCategory,
    pub required: usize,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub profile: PreferenceProfile,
}

fn department_for(category: TasteCategory) -> Option<Department> {
    match category {
        TasteCategory::Actors => Some(Department::Acting),
        TasteCategory::Directors => Some(Department::Directing),
        _ => None,
    }
}

fn entries<T: Into<CatalogEntry>>(items: Vec<T>) -> Vec<CatalogEntry> {
    items.into_iter().map(Into::into).collect()
}

async fn fetch_popular(
    catalog: &dyn CatalogApi,
    category: TasteCategory,
    page: u32,
) -> Result<CatalogPage<CatalogEntry>, ServiceError> {
    match category {
        TasteCategory::Genres => Ok(CatalogPage::new(Vec::new(), Some(1))),
        TasteCategory::Movies => Ok(catalog.popular_movies(page).await?.map(CatalogEntry::from)),
        TasteCategory::Actors | TasteCategory::Directors => {
            let department = department_for(category).unwrap_or(Department::Acting);
            Ok(catalog.popular_people(department, page).await?.map(CatalogEntry::from))
        }
    }
}

/// Snap a rating to the slider's 0.5 steps inside 0..=10
pub fn clamp_rating(value: f64) -> f64 {
    if !value.is_finite() {
        return MIN_RATING_FLOOR;
    }
    let snapped = (value / RATING_STEP).round() * RATING_STEP;
    snapped.clamp(MIN_RATING_FLOOR, MIN_RATING_CEILING)
}

pub struct PreferencesEditor {
    catalog: Arc<dyn CatalogApi>,
    preferences: Arc<dyn PreferencesApi>,
    minimums: PreferencesConfig,
    profile: PreferenceProfile,
    had_profile: bool,
    panels: BTreeMap<TasteCategory, CategoryPanel>,
    /// Display metadata for selected ids that may not be on any loaded page
    known: HashMap<(TasteCategory, u64), CatalogEntry>,
}

impl PreferencesEditor {
    /// Load the catalog's first pages and the stored profile concurrently, then
    /// pre-select the stored ids and hydrate their display metadata.
    pub async fn open(
        session: &Session,
        catalog: Arc<dyn CatalogApi>,
        preferences: Arc<dyn PreferencesApi>,
        minimums: PreferencesConfig,
        page_size: usize,
    ) -> ViewResult<Self> {
        let email = session.email();
        let (genres, actors, directors, movies, stored) = futures::try_join!(
            catalog.genres(),
            catalog.popular_people(Department::Acting, 1),
            catalog.popular_people(Department::Directing, 1),
            catalog.popular_movies(1),
            preferences.get_preferences(email),
        )?;

        let mut panels = BTreeMap::new();
        panels.insert(
            TasteCategory::Genres,
            CategoryPanel::new(CatalogWindow::complete(page_size, entries(genres))),
        );
        for (category, first_page) in [
            (TasteCategory::Actors, actors.map(CatalogEntry::from)),
            (TasteCategory::Directors, directors.map(CatalogEntry::from)),
            (TasteCategory::Movies, movies.map(CatalogEntry::from)),
        ] {
            let mut window = CatalogWindow::new(page_size);
            window.extend(first_page);
            panels.insert(category, CategoryPanel::new(window));
        }

        let had_profile = stored.is_some();
        let mut known = HashMap::new();
        let profile = match stored {
            Some(stored) => {
                for movie in stored.movies {
                    known.insert((TasteCategory::Movies, movie.id), movie.into());
                }
                for actor in stored.actors {
                    known.insert((TasteCategory::Actors, actor.id), actor.into());
                }
                for director in stored.directors {
                    known.insert((TasteCategory::Directors, director.id), director.into());
                }
                stored.profile
            }
            None => PreferenceProfile::default(),
        };

        let mut editor = Self {
            catalog,
            preferences,
            minimums,
            profile,
            had_profile,
            panels,
            known,
        };
        editor.hydrate_selected().await;
        info!("Opened preferences editor (existing profile: {})", editor.had_profile);
        Ok(editor)
    }

    /// Look up metadata for selected movies and people that no loaded page or stored
    /// snapshot describes. Individual failures are dropped.
    async fn hydrate_selected(&mut self) {
        let mut missing = Vec::new();
        for category in [TasteCategory::Actors, TasteCategory::Directors, TasteCategory::Movies] {
            for id in self.profile.ids(category) {
                if self.entry_for(category, *id).is_none() {
                    missing.push((category, *id));
                }
            }
        }
        if missing.is_empty() {
            return;
        }

        let catalog = self.catalog.clone();
        let lookups = missing.iter().map(|(category, id)| {
            let catalog = catalog.clone();
            let (category, id) = (*category, *id);
            async move {
                let entry = match category {
                    TasteCategory::Movies => catalog.movie(id).await.map(CatalogEntry::from),
                    _ => catalog.person(id).await.map(CatalogEntry::from),
                };
                (category, id, entry)
            }
        });

        for (category, id, entry) in join_all(lookups).await {
            match entry {
                Ok(entry) => {
                    self.known.insert((category, id), entry);
                }
                Err(e) => warn!("Could not load {} {}: {}", category.label(), id, e),
            }
        }
    }

    pub fn had_profile(&self) -> bool {
        self.had_profile
    }

    pub fn profile(&self) -> &PreferenceProfile {
        &self.profile
    }

    pub fn mode(&self, category: TasteCategory) -> Option<&ListMode> {
        self.panels.get(&category).map(|p| &p.mode)
    }

    fn entry_for(&self, category: TasteCategory, id: u64) -> Option<&CatalogEntry> {
        self.known.get(&(category, id)).or_else(|| {
            self.panels.get(&category).and_then(|panel| {
                panel.window.find(id).or_else(|| match &panel.mode {
                    ListMode::Search { results, .. } => results.iter().find(|e| e.id == id),
                    ListMode::Popular { .. } => None,
                })
            })
        })
    }

    /// What the category currently lists: a popular page or search results
    pub fn visible(&self, category: TasteCategory) -> Vec<CatalogEntry> {
        let Some(panel) = self.panels.get(&category) else {
            return Vec::new();
        };
        match &panel.mode {
            ListMode::Popular { page } => panel.window.page(*page).to_vec(),
            ListMode::Search { results, .. } => results.clone(),
        }
    }

    /// Selected items with whatever display metadata is known
    pub fn selected_entries(&self, category: TasteCategory) -> Vec<CatalogEntry> {
        self.profile
            .ids(category)
            .iter()
            .map(|id| {
                self.entry_for(category, *id).cloned().unwrap_or_else(|| CatalogEntry {
                    id: *id,
                    label: format!("#{}", id),
                    image_url: None,
                    detail: None,
                })
            })
            .collect()
    }

    pub fn is_selected(&self, category: TasteCategory, id: u64) -> bool {
        self.profile.ids(category).contains(&id)
    }

    /// Flip an item's selection; returns whether it is now selected
    pub fn toggle(&mut self, category: TasteCategory, id: u64) -> bool {
        if let Some(entry) = self.entry_for(category, id).cloned() {
            self.known.insert((category, id), entry);
        }
        let ids = self.profile.ids_mut(category);
        if ids.remove(&id) {
            false
        } else {
            ids.insert(id);
            true
        }
    }

    pub fn set_min_rating(&mut self, value: f64) -> f64 {
        self.profile.min_rating = clamp_rating(value);
        self.profile.min_rating
    }

    /// Switch to popular mode and show display page `page`, loading backend pages as needed
    pub async fn show_page(&mut self, category: TasteCategory, page: usize) -> ViewResult<()> {
        let catalog = self.catalog.clone();
        let panel = self
            .panels
            .get_mut(&category)
            .ok_or_else(|| ViewError::validation(format!("Unknown category {}", category.label())))?;

        panel.searches.invalidate();
        panel
            .window
            .fill(page, |backend_page| {
                let catalog = catalog.clone();
                async move { fetch_popular(catalog.as_ref(), category, backend_page).await }
            })
            .await?;

        let last_page = panel.window.len().saturating_sub(1) / panel.window.page_size;
        panel.mode = ListMode::Popular {
            page: page.min(last_page),
        };
        Ok(())
    }

    pub fn has_page(&self, category: TasteCategory, page: usize) -> bool {
        self.panels
            .get(&category)
            .is_some_and(|p| p.window.has_page(page))
    }

    /// Start a keyword search. An empty query returns the category to popular mode and
    /// yields no request.
    pub fn begin_search(&mut self, category: TasteCategory, query: &str) -> Option<SearchRequest> {
        let panel = self.panels.get_mut(&category)?;
        let query = query.trim();
        if query.is_empty() {
            panel.searches.invalidate();
            panel.mode = ListMode::Popular { page: 0 };
            return None;
        }
        Some(SearchRequest {
            category,
            query: query.to_string(),
            ticket: panel.searches.issue(),
        })
    }

    /// Run a search against the catalog. Genres are filtered locally.
    pub async fn run_search(&self, request: &SearchRequest) -> ViewResult<Vec<CatalogEntry>> {
        let results = match request.category {
            TasteCategory::Genres => {
                let needle = request.query.to_lowercase();
                self.panels
                    .get(&TasteCategory::Genres)
                    .map(|p| {
                        p.window
                            .items
                            .iter()
                            .filter(|g| g.label.to_lowercase().contains(&needle))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            }
            TasteCategory::Movies => entries(self.catalog.search_movies(&request.query).await?),
            category => {
                let department = department_for(category).unwrap_or(Department::Acting);
                entries(self.catalog.search_people(department, &request.query).await?)
            }
        };
        Ok(results)
    }

    /// Apply results if no newer search or mode switch happened since `request` began
    pub fn apply_search(&mut self, request: SearchRequest, results: Vec<CatalogEntry>) -> bool {
        let Some(panel) = self.panels.get_mut(&request.category) else {
            return false;
        };
        if !panel.searches.is_current(request.ticket) {
            debug!("Dropping stale {} search for '{}'", request.category.label(), request.query);
            return false;
        }
        panel.mode = ListMode::Search {
            query: request.query,
            results,
        };
        true
    }

    pub async fn search(&mut self, category: TasteCategory, query: &str) -> ViewResult<()> {
        let Some(request) = self.begin_search(category, query) else {
            return Ok(());
        };
        let results = self.run_search(&request).await?;
        self.apply_search(request, results);
        Ok(())
    }

    /// Every category below its minimum, in display order
    pub fn shortfalls(&self) -> Vec<Shortfall> {
        TasteCategory::ALL
            .iter()
            .filter_map(|category| {
                let required = self.minimums.minimum(*category);
                let selected = self.profile.ids(*category).len();
                (selected < required).then_some(Shortfall {
                    category: *category,
                    required,
                    selected,
                })
            })
            .collect()
    }

    /// Save exactly the selected ids in one PUT, then run `on_saved`
    pub async fn save<F>(&mut self, session: &Session, on_saved: F) -> ViewResult<SaveOutcome>
    where
        F: FnOnce(&PreferenceProfile),
    {
        let shortfalls = self.shortfalls();
        if !shortfalls.is_empty() {
            let details: Vec<String> = shortfalls
                .iter()
                .map(|s| format!("at least {} {} ({} selected)", s.required, s.category.label().to_lowercase(), s.selected))
                .collect();
            return Err(ViewError::validation(format!("Please select {}", details.join(", "))));
        }

        self.preferences.save_preferences(session.email(), &self.profile).await?;
        self.had_profile = true;
        info!("Preferences saved for {}", session.email());
        on_saved(&self.profile);
        Ok(SaveOutcome {
            profile: self.profile.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{catalog_movie, person, session_for, FakeBackend};
    use cinemarec_models::Genre;
    use cinemarec_services::StoredPreferences;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    fn genre(id: u64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    fn seeded() -> Arc<FakeBackend> {
        let backend = FakeBackend::new();
        *backend.genres.lock().unwrap() = vec![
            genre(28, "Action"),
            genre(18, "Drama"),
            genre(35, "Comedy"),
            genre(27, "Horror"),
        ];
        backend.people_pages.lock().unwrap().insert(
            "actors",
            vec![
                vec![person(1, "Actor One", "Acting"), person(2, "Actor Two", "Acting")],
                vec![person(3, "Actor Three", "Acting")],
                vec![],
            ],
        );
        backend
            .people_pages
            .lock()
            .unwrap()
            .insert("directors", vec![vec![person(10, "Director", "Directing")]]);
        *backend.movie_pages.lock().unwrap() = vec![
            vec![catalog_movie(550, "Fight Club"), catalog_movie(603, "The Matrix")],
            vec![catalog_movie(13, "Forrest Gump")],
        ];
        backend
    }

    async fn open(backend: &Arc<FakeBackend>, page_size: usize) -> PreferencesEditor {
        PreferencesEditor::open(
            &session_for("ann@x.io"),
            backend.clone(),
            backend.clone(),
            PreferencesConfig::default(),
            page_size,
        )
        .await
        .unwrap()
    }

    fn select_minimum(editor: &mut PreferencesEditor) {
        for id in [28, 18, 35] {
            editor.toggle(TasteCategory::Genres, id);
        }
        editor.toggle(TasteCategory::Actors, 1);
        for id in [550, 603, 13] {
            editor.toggle(TasteCategory::Movies, id);
        }
    }

    #[test]
    fn test_clamp_rating() {
        assert_eq!(clamp_rating(7.3), 7.5);
        assert_eq!(clamp_rating(-2.0), 0.0);
        assert_eq!(clamp_rating(12.0), 10.0);
        assert_eq!(clamp_rating(f64::NAN), 0.0);
    }

    fn backend_page(items: Vec<CatalogEntry>, total_pages: Option<u32>) -> CatalogPage<CatalogEntry> {
        CatalogPage::new(items, total_pages)
    }

    #[test]
    fn test_window_paging() {
        let mut window = CatalogWindow::new(2);
        assert!(window.needs_more(0));
        window.extend(backend_page(vec![CatalogEntry::from(genre(1, "a"))], Some(3)));
        assert!(window.needs_more(0));
        window.extend(backend_page(
            vec![CatalogEntry::from(genre(2, "b")), CatalogEntry::from(genre(1, "a"))],
            Some(3),
        ));
        assert_eq!(window.len(), 2);
        assert!(!window.needs_more(0));
        assert_eq!(window.next_backend_page(), 3);
        assert!(!window.is_exhausted());

        window.extend(backend_page(vec![], Some(3)));
        assert!(window.is_exhausted());
        assert!(!window.needs_more(5));
        assert!(!window.has_page(1));
        assert_eq!(window.page(3), &[]);
    }

    #[test]
    fn test_window_empty_page_is_not_the_end() {
        let mut window = CatalogWindow::new(2);
        window.extend(backend_page(vec![], Some(500)));
        assert!(!window.is_exhausted());
        assert!(window.has_page(0));

        // without a page count, only a run of empty pages ends the catalog
        let mut window = CatalogWindow::new(2);
        for _ in 0..MAX_EMPTY_RUN - 1 {
            window.extend(backend_page(vec![], None));
        }
        assert!(!window.is_exhausted());
        window.extend(backend_page(vec![CatalogEntry::from(genre(1, "a"))], None));
        for _ in 0..MAX_EMPTY_RUN {
            window.extend(backend_page(vec![], None));
        }
        assert!(window.is_exhausted());
        assert_eq!(window.len(), 1);
    }

    #[tokio::test]
    async fn test_window_fill_stops_after_empty_run() {
        let mut window = CatalogWindow::new(2);
        let requests = Cell::new(0u32);
        window
            .fill(0, |_| {
                requests.set(requests.get() + 1);
                async { Ok::<_, ServiceError>(backend_page(vec![], Some(500))) }
            })
            .await
            .unwrap();
        assert_eq!(requests.get(), MAX_EMPTY_RUN);
        // still not exhausted: a later fill keeps going
        assert!(window.has_page(0));
    }

    #[tokio::test]
    async fn test_filtered_empty_first_page_loads_more() {
        let backend = seeded();
        backend
            .people_pages
            .lock()
            .unwrap()
            .insert("directors", vec![vec![], vec![person(10, "Director", "Directing")]]);
        let mut editor = open(&backend, 20).await;
        assert!(editor.visible(TasteCategory::Directors).is_empty());
        assert!(editor.has_page(TasteCategory::Directors, 0));

        editor.show_page(TasteCategory::Directors, 0).await.unwrap();
        assert_eq!(backend.count("people:directors:2"), 1);
        let ids: Vec<u64> = editor.visible(TasteCategory::Directors).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![10]);
        assert!(!editor.has_page(TasteCategory::Directors, 1));
    }

    #[tokio::test]
    async fn test_window_fill_fetches_lazily() {
        let backend = seeded();
        let mut editor = open(&backend, 2).await;
        assert_eq!(backend.count("people:actors:1"), 1);
        assert_eq!(backend.count("people:actors:2"), 0);

        editor.show_page(TasteCategory::Actors, 1).await.unwrap();
        assert_eq!(backend.count("people:actors:2"), 1);
        assert_eq!(backend.count("people:actors:3"), 1);
        let ids: Vec<u64> = editor.visible(TasteCategory::Actors).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3]);

        // exhausted: going further back and forth costs no requests
        editor.show_page(TasteCategory::Actors, 0).await.unwrap();
        editor.show_page(TasteCategory::Actors, 4).await.unwrap();
        assert_eq!(backend.count("people:actors:4"), 0);
    }

    #[tokio::test]
    async fn test_save_blocked_below_minimums() {
        let backend = seeded();
        let mut editor = open(&backend, 20).await;
        editor.toggle(TasteCategory::Genres, 28);

        let err = editor.save(&session_for("ann@x.io"), |_| {}).await.unwrap_err();
        assert!(err.is_validation());
        let shortfall_categories: Vec<TasteCategory> = editor.shortfalls().iter().map(|s| s.category).collect();
        assert_eq!(
            shortfall_categories,
            vec![TasteCategory::Genres, TasteCategory::Actors, TasteCategory::Movies]
        );
        assert_eq!(backend.count("save_preferences"), 0);
    }

    #[tokio::test]
    async fn test_save_sends_exactly_the_checked_ids() {
        let backend = seeded();
        let mut editor = open(&backend, 20).await;
        select_minimum(&mut editor);
        editor.toggle(TasteCategory::Genres, 27);
        editor.toggle(TasteCategory::Genres, 27);
        editor.set_min_rating(6.2);

        let refreshed = Cell::new(false);
        editor
            .save(&session_for("ann@x.io"), |_| refreshed.set(true))
            .await
            .unwrap();

        assert!(refreshed.get());
        let saved = backend.saved_profiles.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].favorite_genres, BTreeSet::from([18, 28, 35]));
        assert_eq!(saved[0].favorite_actors, BTreeSet::from([1]));
        assert_eq!(saved[0].favorite_movies, BTreeSet::from([13, 550, 603]));
        assert!(saved[0].favorite_directors.is_empty());
        assert_eq!(saved[0].min_rating, 6.0);
    }

    #[tokio::test]
    async fn test_open_preselects_and_hydrates() {
        let backend = seeded();
        let mut profile = PreferenceProfile::default();
        profile.favorite_movies.extend([550, 999, 998]);
        profile.favorite_actors.insert(77);
        *backend.preferences.lock().unwrap() = Some(StoredPreferences {
            profile,
            actors: vec![person(77, "Stored Actor", "Acting")],
            ..StoredPreferences::default()
        });
        backend
            .catalog_movies
            .lock()
            .unwrap()
            .insert(999, catalog_movie(999, "Hydrated"));

        let editor = open(&backend, 20).await;

        assert!(editor.had_profile());
        assert!(editor.is_selected(TasteCategory::Movies, 550));
        let labels: Vec<String> = editor
            .selected_entries(TasteCategory::Movies)
            .into_iter()
            .map(|e| e.label)
            .collect();
        // 998 could not be looked up and keeps a placeholder label
        assert_eq!(labels, vec!["Fight Club", "#998", "Hydrated"]);
        assert_eq!(editor.selected_entries(TasteCategory::Actors)[0].label, "Stored Actor");
        assert_eq!(backend.count("catalog_movie"), 2);
        assert_eq!(backend.count("catalog_person"), 0);
    }

    #[tokio::test]
    async fn test_only_latest_search_applies() {
        let backend = seeded();
        backend
            .movie_search
            .lock()
            .unwrap()
            .insert("matrix".to_string(), vec![catalog_movie(603, "The Matrix")]);
        backend
            .movie_search
            .lock()
            .unwrap()
            .insert("fight".to_string(), vec![catalog_movie(550, "Fight Club")]);
        let mut editor = open(&backend, 20).await;

        let slow = editor.begin_search(TasteCategory::Movies, "matrix").unwrap();
        let fast = editor.begin_search(TasteCategory::Movies, "fight").unwrap();
        let fast_results = editor.run_search(&fast).await.unwrap();
        let slow_results = editor.run_search(&slow).await.unwrap();

        assert!(editor.apply_search(fast, fast_results));
        assert!(!editor.apply_search(slow, slow_results));
        let visible: Vec<u64> = editor.visible(TasteCategory::Movies).iter().map(|e| e.id).collect();
        assert_eq!(visible, vec![550]);

        editor.search(TasteCategory::Movies, "  ").await.unwrap();
        assert_eq!(editor.mode(TasteCategory::Movies), Some(&ListMode::Popular { page: 0 }));
    }

    #[tokio::test]
    async fn test_genre_search_is_local() {
        let backend = seeded();
        let mut editor = open(&backend, 2).await;
        editor.search(TasteCategory::Genres, "dr").await.unwrap();
        let labels: Vec<String> = editor.visible(TasteCategory::Genres).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Drama"]);

        editor.search(TasteCategory::Genres, "o").await.unwrap();
        assert_eq!(editor.visible(TasteCategory::Genres).len(), 3);
    }

    #[tokio::test]
    async fn test_open_fails_when_profile_fetch_fails() {
        let backend = seeded();
        backend.fail_on("get_preferences");
        let result = PreferencesEditor::open(
            &session_for("ann@x.io"),
            backend.clone(),
            backend.clone(),
            PreferencesConfig::default(),
            20,
        )
        .await;
        assert!(matches!(result, Err(ViewError::Service(_))));
    }
}
