//! Entity slice: the operations that keep an [`EntityState`] in sync with
//! its REST resource.
//!
//! Every operation dispatches `pending`, awaits the request, then
//! dispatches `fulfilled` or `rejected`. Concurrent operations are not
//! serialized against each other; the shared flags reflect whichever
//! transition was applied last.

pub mod action;
pub mod reducer;
pub mod state;
pub mod store;

pub use action::{Action, Phase};
pub use reducer::reduce;
pub use state::{BookState, EntityState};
pub use store::Store;

use crate::api::client::{EntityApi, Fetched, ListQuery, Page, RestEntityApi};
use crate::api::config::ClientConfig;
use crate::core::{Book, ClientError, Entity, EntityId, SerializedError};
use std::sync::Arc;
use tokio::sync::watch;

pub type OperationResult<P> = std::result::Result<Fetched<P>, SerializedError>;

pub struct EntitySlice<T: Entity> {
    api: Arc<dyn EntityApi<T>>,
    store: Store<T>,
}

impl<T: Entity> Clone for EntitySlice<T> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
        }
    }
}

impl<T: Entity> EntitySlice<T> {
    /// Slice over `api`. Spawns the store's reducer task, so this must be
    /// called from within a tokio runtime.
    pub fn new(api: Arc<dyn EntityApi<T>>) -> Self {
        Self {
            api,
            store: Store::new(),
        }
    }

    /// Slice over the REST resource described by `config`. Like
    /// [`EntitySlice::new`], this must be called from within a tokio runtime.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let api = RestEntityApi::<T>::new(config)?;
        Ok(Self::new(Arc::new(api)))
    }

    pub fn api(&self) -> &Arc<dyn EntityApi<T>> {
        &self.api
    }

    pub fn state(&self) -> EntityState<T> {
        self.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<EntityState<T>> {
        self.store.subscribe()
    }

    pub async fn get_entities(&self, query: ListQuery) -> OperationResult<Page<T>> {
        let continuation = query.continuation;
        self.store
            .dispatch(Action::FetchEntityList {
                continuation,
                phase: Phase::Pending,
            })
            .await;

        match self.api.list(&query).await {
            Ok(fetched) => {
                self.store
                    .dispatch(Action::FetchEntityList {
                        continuation,
                        phase: Phase::Fulfilled(fetched.data.clone()),
                    })
                    .await;
                Ok(fetched)
            }
            Err(err) => {
                let error = SerializedError::from(err);
                self.store
                    .dispatch(Action::FetchEntityList {
                        continuation,
                        phase: Phase::Rejected(error.clone()),
                    })
                    .await;
                Err(error)
            }
        }
    }

    pub async fn get_entity(&self, id: &EntityId) -> OperationResult<T> {
        self.settle(Action::FetchEntity, self.api.get(id)).await
    }

    pub async fn create_entity(&self, entity: &T) -> OperationResult<T> {
        self.settle(Action::CreateEntity, self.api.create(entity)).await
    }

    pub async fn update_entity(&self, entity: &T) -> OperationResult<T> {
        self.settle(Action::UpdateEntity, self.api.update(entity)).await
    }

    pub async fn partial_update_entity(&self, entity: &T) -> OperationResult<T> {
        self.settle(Action::PartialUpdateEntity, self.api.partial_update(entity))
            .await
    }

    pub async fn delete_entity(&self, id: &EntityId) -> OperationResult<()> {
        self.settle(Action::DeleteEntity, self.api.delete(id)).await
    }

    /// Restores the initial state.
    pub async fn reset(&self) {
        self.store.dispatch(Action::Reset).await;
    }

    async fn settle<P, F>(&self, action: fn(Phase<P>) -> Action<T>, request: F) -> OperationResult<P>
    where
        P: Clone,
        F: Future<Output = Result<Fetched<P>, ClientError>>,
    {
        self.store.dispatch(action(Phase::Pending)).await;

        match request.await {
            Ok(fetched) => {
                self.store
                    .dispatch(action(Phase::Fulfilled(fetched.data.clone())))
                    .await;
                Ok(fetched)
            }
            Err(err) => {
                let error = SerializedError::from(err);
                self.store.dispatch(action(Phase::Rejected(error.clone()))).await;
                Err(error)
            }
        }
    }
}

pub type BookSlice = EntitySlice<Book>;
