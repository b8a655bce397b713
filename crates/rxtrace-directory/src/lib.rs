//! # rxtrace-directory — Actor Directory
//!
//! An immutable, insertion-ordered snapshot of [`Actor`] reference data with
//! indexed lookup by id and by name. Built once at startup (from a seed file
//! or the database) and shared behind an `Arc`; concurrent readers need no
//! locking.
//!
//! The "who can receive this" query ([`ActorDirectory::receivers_for`]) goes
//! through [`Role::successor`], so the directory and the custody state machine
//! agree on one custody order.

use std::collections::HashMap;

use rxtrace_core::{Actor, ActorId, ErrorKind, Role, ValidationError};
use thiserror::Error;

/// Errors raised by directory construction and lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    /// No actor with this id.
    #[error("unknown actor id {0:?}")]
    UnknownActor(String),

    /// No actor with this name.
    #[error("no actor named {0:?}")]
    UnknownName(String),

    /// Two actors share an id.
    #[error("duplicate actor id {0:?}")]
    DuplicateId(String),

    /// Two actors share a name.
    #[error("duplicate actor name {0:?}")]
    DuplicateName(String),

    /// An actor record failed field validation.
    #[error("invalid actor {id:?}: {source}")]
    InvalidActor {
        /// The offending actor id.
        id: String,
        /// Underlying validation failure.
        #[source]
        source: ValidationError,
    },
}

impl DirectoryError {
    /// The error kind this failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownActor(_) | Self::UnknownName(_) => ErrorKind::NotFound,
            Self::DuplicateId(_) | Self::DuplicateName(_) => ErrorKind::AlreadyExists,
            Self::InvalidActor { .. } => ErrorKind::Validation,
        }
    }
}

/// Immutable actor snapshot with id and name indexes.
#[derive(Debug, Clone, Default)]
pub struct ActorDirectory {
    actors: Vec<Actor>,
    by_id: HashMap<ActorId, usize>,
    by_name: HashMap<String, usize>,
}

impl ActorDirectory {
    /// Build a directory, preserving the given order.
    ///
    /// Rejects duplicate ids, duplicate names and actors that fail
    /// [`Actor::validate`].
    pub fn new(actors: Vec<Actor>) -> Result<Self, DirectoryError> {
        let mut by_id = HashMap::with_capacity(actors.len());
        let mut by_name = HashMap::with_capacity(actors.len());
        for (idx, actor) in actors.iter().enumerate() {
            actor
                .validate()
                .map_err(|source| DirectoryError::InvalidActor {
                    id: actor.id.to_string(),
                    source,
                })?;
            if by_id.insert(actor.id.clone(), idx).is_some() {
                return Err(DirectoryError::DuplicateId(actor.id.to_string()));
            }
            if by_name.insert(actor.name.trim().to_string(), idx).is_some() {
                return Err(DirectoryError::DuplicateName(actor.name.clone()));
            }
        }
        tracing::debug!(actors = actors.len(), "actor directory built");
        Ok(Self {
            actors,
            by_id,
            by_name,
        })
    }

    /// All actors in insertion order.
    pub fn all(&self) -> &[Actor] {
        &self.actors
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Actors with the given role, in insertion order.
    pub fn by_role(&self, role: Role) -> Vec<&Actor> {
        self.actors.iter().filter(|a| a.role == role).collect()
    }

    /// The first actor (insertion order) with the given role.
    pub fn first_with_role(&self, role: Role) -> Option<&Actor> {
        self.actors.iter().find(|a| a.role == role)
    }

    /// Look up an actor by exact name (surrounding whitespace ignored).
    pub fn by_name(&self, name: &str) -> Result<&Actor, DirectoryError> {
        self.by_name
            .get(name.trim())
            .map(|&idx| &self.actors[idx])
            .ok_or_else(|| DirectoryError::UnknownName(name.to_string()))
    }

    /// Look up an actor by id.
    pub fn by_id(&self, id: &ActorId) -> Result<&Actor, DirectoryError> {
        self.by_id
            .get(id)
            .map(|&idx| &self.actors[idx])
            .ok_or_else(|| DirectoryError::UnknownActor(id.to_string()))
    }

    /// Actors eligible to receive custody from `actor`: every actor of the
    /// successor role. Empty for Patients and Regulators.
    pub fn receivers_for(&self, actor: &Actor) -> Vec<&Actor> {
        match actor.role.successor() {
            Some(next) => self.by_role(next),
            None => Vec::new(),
        }
    }
}
