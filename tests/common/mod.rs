// Shared test doubles: a scripted in-memory session driver
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courtbook::driver::{DriverError, ElementHandle, SessionDriver, SessionFactory};
use courtbook::selection::{GridSelectors, SelectionConfig};
use courtbook::workflow::{PageSelectors, WaitPolicy, WorkflowSettings};

/// How a scripted selector misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Clicks and fills on the selector fail
    NotFound,
    /// Waits on the selector expire
    Timeout,
}

#[derive(Default)]
pub struct MockState {
    pub calls: Vec<String>,
    failures: HashMap<String, Failure>,
    fail_navigation: bool,
    columns: usize,
    booked: HashSet<(usize, usize)>,
    refuse_claims: HashSet<(usize, usize)>,
    pub claimed: BTreeSet<(usize, usize)>,
    pub opens: usize,
    pub closes: usize,
    fail_open: bool,
}

/// Cloneable handle onto one shared mock site
#[derive(Clone)]
pub struct MockSite {
    state: Arc<Mutex<MockState>>,
}

impl MockSite {
    /// A site whose grid has `columns` columns, every cell free
    pub fn new(columns: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                columns,
                ..Default::default()
            })),
        }
    }

    pub fn fail(self, selector: &str, failure: Failure) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(selector.to_string(), failure);
        self
    }

    pub fn fail_navigation(self) -> Self {
        self.state.lock().unwrap().fail_navigation = true;
        self
    }

    pub fn fail_open(self) -> Self {
        self.state.lock().unwrap().fail_open = true;
        self
    }

    pub fn book(self, column: usize, row: usize) -> Self {
        self.state.lock().unwrap().booked.insert((column, row));
        self
    }

    pub fn book_column(self, column: usize, rows: impl IntoIterator<Item = usize>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for row in rows {
                state.booked.insert((column, row));
            }
        }
        self
    }

    pub fn refuse_claim(self, column: usize, row: usize) -> Self {
        self.state.lock().unwrap().refuse_claims.insert((column, row));
        self
    }

    pub fn driver(&self) -> MockDriver {
        MockDriver { site: self.clone() }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn called_with(&self, selector: &str) -> bool {
        self.calls().iter().any(|c| c.contains(selector))
    }

    pub fn claimed(&self) -> BTreeSet<(usize, usize)> {
        self.state.lock().unwrap().claimed.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn failure(&self, selector: &str) -> Option<Failure> {
        self.state.lock().unwrap().failures.get(selector).copied()
    }

    fn check_action(&self, selector: &str) -> Result<(), DriverError> {
        match self.failure(selector) {
            Some(Failure::NotFound) => Err(DriverError::ElementNotFound(selector.to_string())),
            _ => Ok(()),
        }
    }

    fn check_wait(&self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        match self.failure(selector) {
            Some(Failure::Timeout) => Err(DriverError::Timeout {
                selector: selector.to_string(),
                timeout,
            }),
            _ => Ok(()),
        }
    }
}

/// Grid selectors the mock understands
pub fn grid_selectors() -> GridSelectors {
    GridSelectors {
        columns: ".col".to_string(),
        cell: "cell:{column}:{row}".to_string(),
        booked_marker: ".booked".to_string(),
        free_marker: ".free".to_string(),
    }
}

/// Settings wired to the mock site, event waits, no pauses
pub fn settings() -> WorkflowSettings {
    WorkflowSettings {
        url: "http://venue.test/h5/main/reservation".to_string(),
        username: "2023001".to_string(),
        password: "hunter2".to_string(),
        companion_name: "Li Hua".to_string(),
        companion_phone: "13800000000".to_string(),
        pages: PageSelectors::default(),
        grid: grid_selectors(),
        selection: SelectionConfig {
            claim_pause_ms: 0,
            ..Default::default()
        },
        wait: WaitPolicy::EventWait(Duration::from_millis(50)),
        ..Default::default()
    }
}

pub struct MockDriver {
    site: MockSite,
}

#[derive(Debug, Clone, Copy)]
enum ElementKind {
    Column,
    Cell(usize, usize),
    Free(usize, usize),
    Plain,
}

pub struct MockElement {
    site: MockSite,
    kind: ElementKind,
}

fn parse_cell(selector: &str) -> Option<(usize, usize)> {
    let rest = selector.strip_prefix("cell:")?;
    let (column, row) = rest.split_once(':')?;
    Some((column.parse().ok()?, row.parse().ok()?))
}

#[async_trait]
impl ElementHandle for MockElement {
    async fn query(&self, selector: &str) -> Result<Option<Self>, DriverError> {
        let ElementKind::Cell(column, row) = self.kind else {
            return Ok(None);
        };
        let booked = self
            .site
            .state
            .lock()
            .unwrap()
            .booked
            .contains(&(column, row));

        let kind = match (selector, booked) {
            (".booked", true) => ElementKind::Plain,
            (".free", false) => ElementKind::Free(column, row),
            _ => return Ok(None),
        };
        Ok(Some(MockElement {
            site: self.site.clone(),
            kind,
        }))
    }

    async fn click(&self) -> Result<(), DriverError> {
        if let ElementKind::Free(column, row) = self.kind {
            self.site.record(format!("claim:{}:{}", column, row));
            let mut state = self.site.state.lock().unwrap();
            if state.refuse_claims.contains(&(column, row)) {
                return Err(DriverError::Session("claim rejected".to_string()));
            }
            state.claimed.insert((column, row));
            state.booked.insert((column, row));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionDriver for MockDriver {
    type Element = MockElement;

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), DriverError> {
        self.site.record(format!("navigate:{}", url));
        if self.site.state.lock().unwrap().fail_navigation {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        self.site.record(format!("fill:{}={}", selector, value));
        self.site.check_action(selector)
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.site.record(format!("click:{}", selector));
        self.site.check_action(selector)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        self.site.record(format!("wait_for:{}", selector));
        self.site.check_wait(selector, timeout)
    }

    async fn query(&self, selector: &str) -> Result<Option<MockElement>, DriverError> {
        let kind = match parse_cell(selector) {
            Some((column, row)) => {
                if column > self.site.state.lock().unwrap().columns {
                    return Ok(None);
                }
                ElementKind::Cell(column, row)
            }
            None => ElementKind::Plain,
        };
        Ok(Some(MockElement {
            site: self.site.clone(),
            kind,
        }))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<MockElement>, DriverError> {
        if selector != ".col" {
            return Ok(Vec::new());
        }
        let columns = self.site.state.lock().unwrap().columns;
        Ok((0..columns)
            .map(|_| MockElement {
                site: self.site.clone(),
                kind: ElementKind::Column,
            })
            .collect())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.site.record("screenshot".to_string());
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.site.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Hands out drivers onto one shared mock site
pub struct MockFactory {
    pub site: MockSite,
}

#[async_trait]
impl SessionFactory for MockFactory {
    type Driver = MockDriver;

    async fn open(&self) -> Result<MockDriver, DriverError> {
        let mut state = self.site.state.lock().unwrap();
        state.opens += 1;
        if state.fail_open {
            return Err(DriverError::Session("webdriver endpoint unreachable".to_string()));
        }
        drop(state);
        Ok(self.site.driver())
    }
}
