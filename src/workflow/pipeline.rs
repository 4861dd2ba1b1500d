// Reservation pipeline
//
// login → venue category → branch & court type → date & mode → claim slots
// → accept terms → companion info → pay
//
// Steps run strictly in order and the first failure ends the pass. Nothing
// is rolled back: a failed pass leaves the remote session in whatever state
// it reached, so callers must treat it as unknown.

use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::context::{RunContext, StepResult};
use super::selectors::PageSelectors;
use super::types::{StepId, WorkflowResult};
use super::wait::WaitPolicy;
use crate::config::constants::{DEFAULT_LOGIN_TIMEOUT_SECS, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_SITE_URL};
use crate::driver::{DriverError, SessionDriver};
use crate::errors::ErrorKind;
use crate::matrix::Task;
use crate::selection::{ClaimOutcome, DriverGrid, GridSelectors, SelectionConfig, SlotSelector};

/// Everything the pipeline needs besides the session and the task
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub url: String,
    pub navigation_timeout: Duration,
    /// Bound on the post-login landmark wait
    pub login_timeout: Duration,
    pub username: String,
    pub password: String,
    pub companion_name: String,
    pub companion_phone: String,
    pub pages: PageSelectors,
    pub grid: GridSelectors,
    pub selection: SelectionConfig,
    pub wait: WaitPolicy,
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SITE_URL.to_string(),
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            login_timeout: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
            username: String::new(),
            password: String::new(),
            companion_name: String::new(),
            companion_phone: String::new(),
            pages: PageSelectors::default(),
            grid: GridSelectors::default(),
            selection: SelectionConfig::default(),
            wait: WaitPolicy::default(),
            screenshot_dir: None,
        }
    }
}

/// The booking pipeline, parameterized by configuration
pub struct ReservationWorkflow {
    settings: WorkflowSettings,
}

impl ReservationWorkflow {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Run every step against `driver` for `task`, stopping at the first failure
    pub async fn run<D: SessionDriver>(&self, driver: &D, task: &Task, attempt: u32) -> WorkflowResult {
        let mut ctx = RunContext::new(driver, task, attempt, self.settings.wait);

        for step in StepId::ALL {
            ctx.enter(step);
            debug!(task = %task.label(), attempt, step = %step, "Running step");

            if let Err(kind) = self.run_step(step, &mut ctx).await {
                warn!(
                    task = %task.label(),
                    attempt,
                    step = %step,
                    error = %kind,
                    "Reservation stopped"
                );
                return WorkflowResult::failed(step, kind, ctx.claimed_column());
            }
        }

        info!(
            task = %task.label(),
            attempt,
            column = ctx.claimed_column(),
            "Reservation completed"
        );
        WorkflowResult::completed(ctx.claimed_column())
    }

    async fn run_step<D: SessionDriver>(&self, step: StepId, ctx: &mut RunContext<'_, D>) -> StepResult {
        match step {
            StepId::Authenticate => self.authenticate(ctx).await,
            StepId::SelectResourceCategory => self.select_resource_category(ctx).await,
            StepId::SelectBranchAndResourceType => self.select_branch_and_resource_type(ctx).await,
            StepId::SelectDateAndMode => self.select_date_and_mode(ctx).await,
            StepId::ClaimSlots => self.claim_slots(ctx).await,
            StepId::AcceptTermsAndReserve => self.accept_terms_and_reserve(ctx).await,
            StepId::FillCompanionInfo => self.fill_companion_info(ctx).await,
            StepId::CompletePayment => self.complete_payment(ctx).await,
        }
    }

    async fn authenticate<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        let pages = &self.settings.pages;

        ctx.driver
            .navigate(&self.settings.url, self.settings.navigation_timeout)
            .await
            .map_err(|e| ctx.fail(e))?;
        ctx.fill(&pages.username, &self.settings.username).await?;
        ctx.fill(&pages.password, &self.settings.password).await?;
        ctx.click(&pages.login_button).await?;

        // The landmark wait is always event-based, whatever the wait policy
        match ctx
            .driver
            .wait_for(&pages.login_landmark, self.settings.login_timeout)
            .await
        {
            Ok(()) => {}
            Err(DriverError::Timeout { timeout, .. }) => {
                warn!(
                    "Login landmark did not appear within {:?} (slow network or rejected credentials)",
                    timeout
                );
                return Err(ErrorKind::AuthenticationFailed);
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                return Err(ErrorKind::AuthenticationFailed);
            }
        }

        info!(task = %ctx.task.label(), "Logged in");
        self.capture(ctx, "login_success").await;
        Ok(())
    }

    async fn select_resource_category<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        let pages = &self.settings.pages;
        ctx.click(&pages.category).await?;
        ctx.settle(Some(pages.branch_picker.as_str())).await
    }

    async fn select_branch_and_resource_type<D: SessionDriver>(
        &self,
        ctx: &mut RunContext<'_, D>,
    ) -> StepResult {
        let pages = &self.settings.pages;
        ctx.click(&pages.branch_picker).await?;
        ctx.settle(Some(pages.branch.as_str())).await?;
        ctx.click(&pages.branch).await?;
        ctx.click(&pages.confirm).await?;
        ctx.settle(Some(pages.resource_type.as_str())).await?;
        ctx.click(&pages.resource_type).await?;
        ctx.click(&pages.next).await?;
        ctx.settle(Some(pages.date.as_str())).await
    }

    async fn select_date_and_mode<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        let pages = &self.settings.pages;
        ctx.click(&pages.date).await?;
        ctx.click(&pages.next).await?;
        ctx.settle(Some(pages.mode.as_str())).await?;
        ctx.click(&pages.mode).await?;
        ctx.click(&pages.next).await?;
        ctx.settle(Some(self.settings.grid.columns.as_str())).await
    }

    async fn claim_slots<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        let mut selection = self.settings.selection.clone();
        if selection.start_at_task_column {
            selection.start_column = ctx.task.resource_column();
        }
        let selector = SlotSelector::new(selection);
        let grid = DriverGrid::new(ctx.driver, &self.settings.grid);

        match selector.select_and_claim(grid, ctx.task.desired_rows()).await {
            ClaimOutcome::Claimed { column, .. } => {
                ctx.record_claim(column);
                Ok(())
            }
            ClaimOutcome::NotFound => Err(ErrorKind::SlotUnavailable),
            ClaimOutcome::PartialClaim { column, .. } => {
                ctx.record_claim(column);
                Err(ErrorKind::PartialClaim)
            }
        }
    }

    async fn accept_terms_and_reserve<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        let pages = &self.settings.pages;
        ctx.click(&pages.agree).await?;
        ctx.settle(Some(pages.reserve.as_str())).await?;
        ctx.click(&pages.reserve).await?;
        ctx.settle(Some(pages.companion_name.as_str())).await
    }

    async fn fill_companion_info<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        let pages = &self.settings.pages;
        ctx.fill(&pages.companion_name, &self.settings.companion_name)
            .await?;
        ctx.fill(&pages.companion_phone, &self.settings.companion_phone)
            .await?;
        ctx.settle(Some(pages.pay.as_str())).await
    }

    async fn complete_payment<D: SessionDriver>(&self, ctx: &mut RunContext<'_, D>) -> StepResult {
        ctx.click(&self.settings.pages.pay).await?;
        ctx.settle(None).await?;
        self.capture(ctx, "reservation_completed").await;
        Ok(())
    }

    /// Save a screenshot when a directory is configured; never fails the step
    async fn capture<D: SessionDriver>(&self, ctx: &RunContext<'_, D>, name: &str) {
        let Some(dir) = &self.settings.screenshot_dir else {
            return;
        };

        let png = match ctx.driver.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!("Screenshot '{}' failed: {}", name, e);
                return;
            }
        };

        let label: String = ctx
            .task
            .label()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = dir.join(format!(
            "{}-{}-{}.png",
            Local::now().format("%Y%m%d-%H%M%S"),
            label,
            name
        ));

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Cannot create screenshot directory {}: {}", dir.display(), e);
            return;
        }
        match tokio::fs::write(&path, png).await {
            Ok(()) => info!("Screenshot saved: {}", path.display()),
            Err(e) => warn!("Cannot write screenshot {}: {}", path.display(), e),
        }
    }
}
