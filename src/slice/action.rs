use crate::api::client::Page;
use crate::core::SerializedError;

/// Lifecycle of one asynchronous operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<P> {
    Pending,
    Fulfilled(P),
    Rejected(SerializedError),
}

impl<P> Phase<P> {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Fulfilled(_) => "fulfilled",
            Phase::Rejected(_) => "rejected",
        }
    }
}

/// Everything the reducer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
    FetchEntityList {
        continuation: bool,
        phase: Phase<Page<T>>,
    },
    FetchEntity(Phase<T>),
    CreateEntity(Phase<T>),
    UpdateEntity(Phase<T>),
    PartialUpdateEntity(Phase<T>),
    DeleteEntity(Phase<()>),
    Reset,
}

impl<T> Action<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::FetchEntityList { .. } => "fetch_entity_list",
            Action::FetchEntity(_) => "fetch_entity",
            Action::CreateEntity(_) => "create_entity",
            Action::UpdateEntity(_) => "update_entity",
            Action::PartialUpdateEntity(_) => "partial_update_entity",
            Action::DeleteEntity(_) => "delete_entity",
            Action::Reset => "reset",
        }
    }

    pub fn phase_name(&self) -> Option<&'static str> {
        match self {
            Action::FetchEntityList { phase, .. } => Some(phase.name()),
            Action::FetchEntity(phase)
            | Action::CreateEntity(phase)
            | Action::UpdateEntity(phase)
            | Action::PartialUpdateEntity(phase) => Some(phase.name()),
            Action::DeleteEntity(phase) => Some(phase.name()),
            Action::Reset => None,
        }
    }
}
