//! Component roles.
//!
//! Every component advertises exactly one role. Pipelines use it to check
//! that a component placed in a slot can do what the slot needs.

use serde::{Deserialize, Serialize};

/// What a component does with the value flowing through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Produces data, usually from its input as a source descriptor.
    Extractor,
    /// Transforms data.
    Processor,
    /// Consumes data, typically with a side effect.
    Handler,
}

impl Role {
    /// Get the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Extractor => "Extractor",
            Role::Processor => "Processor",
            Role::Handler => "Handler",
        }
    }

    /// Name of the capability a component with this role implements.
    pub fn capability(&self) -> &'static str {
        match self {
            Role::Extractor => "extract",
            Role::Processor => "process",
            Role::Handler => "handle",
        }
    }

    /// Get all roles in pipeline order.
    pub fn all() -> &'static [Role] {
        &[Role::Extractor, Role::Processor, Role::Handler]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Extractor => {
                "Produces data from a source.\n\
                 Reads its input as a source descriptor.\n\
                 First slot of a pipeline."
            }

            Role::Processor => {
                "Transforms data.\n\
                 Maps its input to a new value.\n\
                 Default role of nested managers."
            }

            Role::Handler => {
                "Consumes data.\n\
                 Stores, prints or forwards its input.\n\
                 Last slot of a pipeline."
            }
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
