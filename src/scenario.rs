//! End-to-end scenario for the Book screens, driven through a [`BookSlice`]
//! against a live backend.
//!
//! Each step mirrors one UI flow (list, create, view, edit, delete) and
//! checks the HTTP statuses and slice transitions that flow must produce.
//! Records the scenario creates are removed again, including ones left
//! behind by an interrupted earlier run.

use crate::api::client::ListQuery;
use crate::core::{Book, EntityId, SerializedError};
use crate::slice::BookSlice;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub const SAMPLE_NAME: &str = "infrastructures";
pub const SAMPLE_PRICE: f64 = 39916.0;
pub const FORM_NAME: &str = "Oregon zero";
pub const FORM_PRICE: f64 = 47549.0;

const CLEANUP_PAGE_SIZE: u32 = 100;
const SCREEN_PAGE_SIZE: u32 = 20;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("step '{step}': {detail}")]
    Assertion { step: &'static str, detail: String },

    #[error("step '{step}': {source}")]
    Request {
        step: &'static str,
        #[source]
        source: SerializedError,
    },
}

/// Outcome of one scenario step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    pub statuses: Vec<u16>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.name == name)
    }
}

pub fn sample_book() -> Book {
    Book::new(SAMPLE_NAME, SAMPLE_PRICE)
}

pub fn form_book() -> Book {
    Book::new(FORM_NAME, FORM_PRICE)
}

struct Step {
    name: &'static str,
    statuses: Vec<u16>,
}

impl Step {
    fn new(name: &'static str) -> Self {
        info!(step = name, "scenario step started");
        Self {
            name,
            statuses: Vec::new(),
        }
    }

    fn expect(&mut self, observed: u16, expected: u16) -> Result<(), ScenarioError> {
        self.statuses.push(observed);
        if observed != expected {
            return Err(self.fail(format!("expected HTTP {expected}, got {observed}")));
        }
        Ok(())
    }

    fn ensure(&self, condition: bool, detail: &str) -> Result<(), ScenarioError> {
        if condition {
            Ok(())
        } else {
            Err(self.fail(detail.to_string()))
        }
    }

    fn fail(&self, detail: String) -> ScenarioError {
        ScenarioError::Assertion {
            step: self.name,
            detail,
        }
    }

    fn finish(self) -> StepReport {
        info!(step = self.name, statuses = ?self.statuses, "scenario step passed");
        StepReport {
            name: self.name,
            statuses: self.statuses,
        }
    }
}

fn request_failed(step: &'static str) -> impl FnOnce(SerializedError) -> ScenarioError {
    move |source| ScenarioError::Request { step, source }
}

#[derive(Clone, Copy)]
enum ExistingFlow {
    Details,
    Edit,
}

pub struct BookScenario {
    slice: BookSlice,
}

impl BookScenario {
    pub fn new(slice: BookSlice) -> Self {
        Self { slice }
    }

    pub async fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        let mut report = ScenarioReport::default();

        report.steps.push(self.cleanup_leftovers().await?);
        report.steps.push(self.list_screen().await?);
        report.steps.push(self.create_then_cancel().await?);
        report.steps.push(self.view_details().await?);
        report.steps.push(self.edit_then_cancel().await?);
        report.steps.push(self.delete_with_confirmation().await?);
        report.steps.push(self.create_from_form().await?);

        Ok(report)
    }

    /// Removes records left by earlier runs that never reached their cleanup.
    pub async fn cleanup_leftovers(&self) -> Result<StepReport, ScenarioError> {
        let mut step = Step::new("cleanup leftovers");
        let mut page = 0;
        let mut stale: Vec<EntityId> = Vec::new();

        loop {
            let query = ListQuery::new()
                .page(page)
                .size(CLEANUP_PAGE_SIZE)
                .sort("id,asc");
            let fetched = self
                .slice
                .get_entities(query)
                .await
                .map_err(request_failed(step.name))?;
            step.expect(fetched.status, 200)?;

            stale.extend(
                fetched
                    .data
                    .items
                    .iter()
                    .filter(|book| is_scenario_record(book))
                    .filter_map(|book| book.id.clone()),
            );

            let last = fetched.data.links.last().unwrap_or(0);
            if fetched.data.items.is_empty() || u64::from(page) >= last {
                break;
            }
            page += 1;
        }

        for id in stale {
            warn!(id = %id, "removing leftover scenario record");
            let deleted = self
                .slice
                .delete_entity(&id)
                .await
                .map_err(request_failed(step.name))?;
            step.expect(deleted.status, 204)?;
        }

        self.slice.reset().await;
        Ok(step.finish())
    }

    /// Opening the list screen loads the collection; the table is shown
    /// only when it is non-empty.
    pub async fn list_screen(&self) -> Result<StepReport, ScenarioError> {
        let mut step = Step::new("list screen");
        self.slice.reset().await;

        let listed = self.open_list(&mut step).await?;
        let state = self.slice.state();
        let table_visible = !state.entities.is_empty();
        step.ensure(
            table_visible == !listed.is_empty(),
            "table visibility does not match the list response",
        )?;
        step.ensure(!state.loading, "list is still loading after settlement")?;

        Ok(step.finish())
    }

    /// The create form submits nothing until saved; cancel returns to the list.
    pub async fn create_then_cancel(&self) -> Result<StepReport, ScenarioError> {
        let mut step = Step::new("create button then cancel");
        self.slice.reset().await;
        step.ensure(
            self.slice.state().entity.id.is_none(),
            "new form must start without an id",
        )?;

        self.open_list(&mut step).await?;
        self.ensure_unsubmitted(&step)?;
        Ok(step.finish())
    }

    /// Opens the detail screen of a seeded record, then goes back.
    pub async fn view_details(&self) -> Result<StepReport, ScenarioError> {
        self.with_existing("detail then back", ExistingFlow::Details)
            .await
    }

    /// Opens the edit form of a seeded record, then cancels.
    pub async fn edit_then_cancel(&self) -> Result<StepReport, ScenarioError> {
        self.with_existing("edit then cancel", ExistingFlow::Edit)
            .await
    }

    /// Seeds the sample record and deletes it through the confirmation
    /// dialog: load, confirm (204), refreshed list without the record.
    pub async fn delete_with_confirmation(&self) -> Result<StepReport, ScenarioError> {
        let mut step = Step::new("delete with confirmation");
        let created = self.seed(&mut step).await?;
        let id = created
            .id
            .clone()
            .ok_or_else(|| step.fail("created record has no id".to_string()))?;

        let result = self.delete_flow(&mut step, &id).await;
        if result.is_err() {
            self.discard(&id).await;
        }
        result?;

        Ok(step.finish())
    }

    /// Fills the new-entity form and saves it.
    pub async fn create_from_form(&self) -> Result<StepReport, ScenarioError> {
        let mut step = Step::new("create from form");
        self.slice.reset().await;

        let created = self
            .slice
            .create_entity(&form_book())
            .await
            .map_err(request_failed(step.name))?;

        let result = self
            .confirm_created(&mut step, created.status, &created.data)
            .await;
        if let Some(id) = &created.data.id {
            self.discard(id).await;
        }
        result?;

        Ok(step.finish())
    }

    async fn with_existing(
        &self,
        name: &'static str,
        flow: ExistingFlow,
    ) -> Result<StepReport, ScenarioError> {
        let mut step = Step::new(name);
        let created = self.seed(&mut step).await?;

        let result = match flow {
            ExistingFlow::Details => self.open_then_leave(&mut step, &created).await,
            ExistingFlow::Edit => self.open_then_leave(&mut step, &created).await.and_then(|()| {
                self.ensure_unsubmitted(&step)
            }),
        };

        if let Some(id) = &created.id {
            self.discard(id).await;
        }
        result?;

        Ok(step.finish())
    }

    async fn open_then_leave(&self, step: &mut Step, book: &Book) -> Result<(), ScenarioError> {
        self.slice.reset().await;
        let id = book
            .id
            .clone()
            .ok_or_else(|| step.fail("record has no id".to_string()))?;

        let fetched = self
            .slice
            .get_entity(&id)
            .await
            .map_err(request_failed(step.name))?;
        step.expect(fetched.status, 200)?;
        step.ensure(
            self.slice.state().entity == *book,
            "loaded entity differs from the record",
        )?;
        self.ensure_unsubmitted(step)?;

        self.open_list(step).await?;
        Ok(())
    }

    async fn confirm_created(
        &self,
        step: &mut Step,
        status: u16,
        created: &Book,
    ) -> Result<(), ScenarioError> {
        step.expect(status, 201)?;
        step.ensure(created.id.is_some(), "created record has no id")?;

        let state = self.slice.state();
        step.ensure(state.update_success, "create did not mark update success")?;
        step.ensure(state.entity == *created, "entity is not the server record")?;

        let listed = self.open_newest(step).await?;
        step.ensure(
            listed.iter().any(|book| book.id == created.id),
            "created record is missing from the list",
        )
    }

    async fn delete_flow(&self, step: &mut Step, id: &EntityId) -> Result<(), ScenarioError> {
        self.slice.reset().await;
        let listed = self.open_newest(step).await?;
        step.ensure(
            listed.iter().any(|book| book.id.as_ref() == Some(id)),
            "seeded record is not visible",
        )?;

        // The confirmation dialog loads the record before asking.
        let fetched = self
            .slice
            .get_entity(id)
            .await
            .map_err(request_failed(step.name))?;
        step.expect(fetched.status, 200)?;

        let deleted = self
            .slice
            .delete_entity(id)
            .await
            .map_err(request_failed(step.name))?;
        step.expect(deleted.status, 204)?;

        let state = self.slice.state();
        step.ensure(state.update_success, "delete did not mark update success")?;
        step.ensure(
            state.entity == Book::default(),
            "entity not cleared after delete",
        )?;

        let remaining = self.open_newest(step).await?;
        step.ensure(
            remaining.iter().all(|book| book.id.as_ref() != Some(id)),
            "deleted record is still listed",
        )
    }

    async fn seed(&self, step: &mut Step) -> Result<Book, ScenarioError> {
        let created = self
            .slice
            .api()
            .create(&sample_book())
            .await
            .map_err(|err| request_failed(step.name)(SerializedError::from(err)))?;
        if let Err(err) = step.expect(created.status, 201) {
            if let Some(id) = &created.data.id {
                self.discard(id).await;
            }
            return Err(err);
        }
        Ok(created.data)
    }

    async fn open_list(&self, step: &mut Step) -> Result<Vec<Book>, ScenarioError> {
        self.list_with(step, ListQuery::new()).await
    }

    // Newest first, so a just-created record is on the first page.
    async fn open_newest(&self, step: &mut Step) -> Result<Vec<Book>, ScenarioError> {
        let query = ListQuery::new()
            .page(0)
            .size(SCREEN_PAGE_SIZE)
            .sort("id,desc");
        self.list_with(step, query).await
    }

    async fn list_with(&self, step: &mut Step, query: ListQuery) -> Result<Vec<Book>, ScenarioError> {
        let fetched = self
            .slice
            .get_entities(query)
            .await
            .map_err(request_failed(step.name))?;
        step.expect(fetched.status, 200)?;
        Ok(fetched.data.items)
    }

    fn ensure_unsubmitted(&self, step: &Step) -> Result<(), ScenarioError> {
        let state = self.slice.state();
        step.ensure(!state.updating, "a mutation is in flight")?;
        step.ensure(!state.update_success, "a mutation was submitted")
    }

    async fn discard(&self, id: &EntityId) {
        if let Err(err) = self.slice.api().delete(id).await {
            warn!(id = %id, error = %err, "failed to remove scenario record");
        }
    }
}

fn is_scenario_record(book: &Book) -> bool {
    matches!(book.name.as_deref(), Some(SAMPLE_NAME) | Some(FORM_NAME))
}
