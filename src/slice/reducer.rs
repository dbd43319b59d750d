use crate::api::pagination::load_more_data_when_scrolled;
use crate::core::{Entity, SerializedError};
use crate::slice::action::{Action, Phase};
use crate::slice::state::EntityState;

/// Computes the next slice state. Pure: no I/O, no shared state.
pub fn reduce<T: Entity>(mut state: EntityState<T>, action: Action<T>) -> EntityState<T> {
    match action {
        Action::Reset => EntityState::initial(),

        Action::FetchEntityList { continuation, phase } => match phase {
            Phase::Pending => begin_loading(state),
            Phase::Fulfilled(page) => {
                state.entities = if continuation {
                    load_more_data_when_scrolled(&state.entities, page.items, &page.links)
                } else {
                    page.items
                };
                state.loading = false;
                state.links = page.links;
                state.total_items = page.total_items;
                state
            }
            Phase::Rejected(error) => reject(state, error),
        },

        Action::FetchEntity(phase) => match phase {
            Phase::Pending => begin_loading(state),
            Phase::Fulfilled(entity) => {
                state.loading = false;
                state.entity = entity;
                state
            }
            Phase::Rejected(error) => reject(state, error),
        },

        Action::CreateEntity(phase)
        | Action::UpdateEntity(phase)
        | Action::PartialUpdateEntity(phase) => match phase {
            Phase::Pending => begin_updating(state),
            Phase::Fulfilled(entity) => {
                state.updating = false;
                state.loading = false;
                state.update_success = true;
                state.entity = entity;
                state
            }
            Phase::Rejected(error) => reject(state, error),
        },

        Action::DeleteEntity(phase) => match phase {
            Phase::Pending => begin_updating(state),
            Phase::Fulfilled(()) => {
                state.updating = false;
                state.update_success = true;
                state.entity = T::default();
                state
            }
            Phase::Rejected(error) => reject(state, error),
        },
    }
}

fn begin_loading<T>(mut state: EntityState<T>) -> EntityState<T> {
    state.error_message = None;
    state.update_success = false;
    state.loading = true;
    state
}

fn begin_updating<T>(mut state: EntityState<T>) -> EntityState<T> {
    state.error_message = None;
    state.update_success = false;
    state.updating = true;
    state
}

fn reject<T>(mut state: EntityState<T>, error: SerializedError) -> EntityState<T> {
    state.loading = false;
    state.updating = false;
    state.update_success = false;
    state.error_message = Some(error.message);
    state
}
