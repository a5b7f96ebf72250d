use super::Interaction;

/// A named conversation branch targeting one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: String,
    pub model: String,
    interactions: Vec<Interaction>,
}

impl Session {
    pub fn new(name: &str, model: &str) -> Session {
        return Session {
            name: name.to_string(),
            model: model.to_string(),
            interactions: vec![],
        };
    }

    /// Copies the history of `self` into a new branch. The copy shares nothing
    /// with the source afterwards.
    pub fn fork(&self, name: &str) -> Session {
        return Session {
            name: name.to_string(),
            model: self.model.to_string(),
            interactions: self.interactions.clone(),
        };
    }

    pub fn interactions(&self) -> &[Interaction] {
        return &self.interactions;
    }

    pub fn push(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
    }

    /// Continuation tokens to send with the next request.
    pub fn context(&self) -> Option<Vec<i64>> {
        return self
            .interactions
            .last()
            .and_then(|interaction| return interaction.response().context.clone());
    }
}
