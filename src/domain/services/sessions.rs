#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::domain::models::ClientError;
use crate::domain::models::GenerateRequest;
use crate::domain::models::GenerateResponse;
use crate::domain::models::Interaction;
use crate::domain::models::Session;

#[derive(Default)]
struct RegistryState {
    branches: HashMap<String, Session>,
    /// Model name to the branch currently used for it.
    current: HashMap<String, String>,
    active_model: Option<String>,
}

impl RegistryState {
    fn current_branch(&self) -> Option<&String> {
        let model = self.active_model.as_ref()?;
        return self.current.get(model);
    }

    fn current_session(&self) -> Option<&Session> {
        let branch = self.current_branch()?;
        return self.branches.get(branch);
    }
}

/// Named conversation branches of one client, and which branch is in use for
/// each model.
///
/// All state sits behind a single mutex so creating, cloning and appending are
/// atomic with respect to each other. Share it between tasks with an `Arc`.
/// Sessions handed out are snapshots; history only changes through
/// [`SessionRegistry::append`].
#[derive(Default)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
}

impl SessionRegistry {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Every mutation is a single insert or push, a poisoned state is still whole.
        return self
            .state
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    /// Returns the session bound to `model`, creating an empty branch named
    /// after the model when there is none. When that name is taken by a
    /// branch of another model, a numeric suffix is added. `model` becomes the
    /// active model.
    pub fn ensure_session(&self, model: &str) -> Session {
        let mut state = self.lock();
        state.active_model = Some(model.to_string());

        if let Some(branch) = state.current.get(model) {
            if let Some(session) = state.branches.get(branch) {
                return session.clone();
            }
        }

        let mut name = model.to_string();
        let mut suffix = 1;
        while let Some(existing) = state.branches.get(&name) {
            if existing.model == model {
                break;
            }
            suffix += 1;
            name = format!("{model}-{suffix}");
        }

        let session = state
            .branches
            .entry(name.to_string())
            .or_insert_with(|| return Session::new(&name, model))
            .clone();
        state.current.insert(model.to_string(), name.to_string());

        tracing::debug!(model, branch = %session.name, "Bound session to model");
        return session;
    }

    /// Copies the current session into a new branch called `name` and makes it
    /// current for its model. Existing branches are never replaced.
    pub fn clone_branch(&self, name: &str) -> Result<Session, ClientError> {
        let mut state = self.lock();
        if state.branches.contains_key(name) {
            return Err(ClientError::SessionState(format!(
                "a branch named {name} already exists"
            )));
        }

        let source = match state.current_session() {
            Some(session) => session,
            None => {
                return Err(ClientError::SessionState(format!(
                    "no current session to clone into branch {name}"
                )));
            }
        };

        let session = source.fork(name);
        state
            .current
            .insert(session.model.to_string(), name.to_string());
        state.branches.insert(name.to_string(), session.clone());

        tracing::debug!(
            branch = name,
            model = %session.model,
            interactions = session.interactions().len(),
            "Cloned branch"
        );
        return Ok(session);
    }

    /// Binds an existing branch as current for its model and activates that
    /// model.
    pub fn switch_branch(&self, name: &str) -> Result<Session, ClientError> {
        let mut state = self.lock();
        let session = match state.branches.get(name) {
            Some(session) => session.clone(),
            None => {
                return Err(ClientError::SessionState(format!("no branch named {name}")));
            }
        };

        state
            .current
            .insert(session.model.to_string(), name.to_string());
        state.active_model = Some(session.model.to_string());

        return Ok(session);
    }

    /// Continuation tokens for the next request of the current session.
    pub fn current_context(&self) -> Option<Vec<i64>> {
        return self.lock().current_session()?.context();
    }

    /// Records one turn on the current session.
    pub fn append(
        &self,
        request: GenerateRequest,
        response: GenerateResponse,
    ) -> Result<(), ClientError> {
        let mut state = self.lock();
        let branch = match state.current_branch() {
            Some(branch) => branch.to_string(),
            None => {
                return Err(ClientError::SessionState(
                    "no current session to append to".to_string(),
                ));
            }
        };

        let model = state.active_model.clone().unwrap_or_default();
        state
            .branches
            .entry(branch)
            .or_insert_with_key(|name| return Session::new(name, &model))
            .push(Interaction::new(request, response));

        return Ok(());
    }

    /// Records one turn on the branch `name`, whether or not it is current.
    /// Used when the turn was started before another branch was switched to.
    pub fn append_to(
        &self,
        name: &str,
        request: GenerateRequest,
        response: GenerateResponse,
    ) -> Result<(), ClientError> {
        let mut state = self.lock();
        match state.branches.get_mut(name) {
            Some(session) => {
                session.push(Interaction::new(request, response));
                return Ok(());
            }
            None => {
                return Err(ClientError::SessionState(format!("no branch named {name}")));
            }
        }
    }

    pub fn current(&self) -> Option<Session> {
        return self.lock().current_session().cloned();
    }

    pub fn session(&self, name: &str) -> Option<Session> {
        return self.lock().branches.get(name).cloned();
    }

    pub fn active_model(&self) -> Option<String> {
        return self.lock().active_model.clone();
    }

    /// Branch names, sorted.
    pub fn branches(&self) -> Vec<String> {
        let mut names = self.lock().branches.keys().cloned().collect::<Vec<String>>();
        names.sort();
        return names;
    }
}
