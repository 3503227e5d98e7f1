use crate::document::Node;
use crate::error::SlotError;
use itertools::Itertools;
use std::fmt;

/// Which slot collection of a node a specification addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDirection {
    Input,
    Output,
}

/// A caller-supplied reference to a slot: a numeric index, or a string
/// holding a number, a slot name, or a slot type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSpec {
    Index(usize),
    Named(String),
}

impl From<usize> for SlotSpec {
    fn from(index: usize) -> Self {
        SlotSpec::Index(index)
    }
}

impl From<&str> for SlotSpec {
    fn from(spec: &str) -> Self {
        SlotSpec::Named(spec.to_string())
    }
}

impl From<String> for SlotSpec {
    fn from(spec: String) -> Self {
        SlotSpec::Named(spec)
    }
}

impl fmt::Display for SlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSpec::Index(index) => write!(f, "{}", index),
            SlotSpec::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Resolve a slot specification to a zero-based slot index on `node`.
///
/// Numeric interpretation is tried first. String specifications then match
/// case-insensitively against each slot's name or type in slot order; the
/// first slot matching either wins. Failures carry either the out-of-range
/// index or the full `index:name` listing of available slots.
pub fn resolve_slot(
    node: &Node,
    spec: &SlotSpec,
    direction: SlotDirection,
) -> Result<usize, SlotError> {
    let (names, types): (Vec<&str>, Vec<&str>) = match direction {
        SlotDirection::Input => node
            .inputs
            .iter()
            .map(|s| (s.name.as_str(), s.dtype.as_str()))
            .unzip(),
        SlotDirection::Output => node
            .outputs
            .iter()
            .map(|s| (s.name.as_str(), s.dtype.as_str()))
            .unzip(),
    };

    let check_index = |index: usize| {
        if index < names.len() {
            Ok(index)
        } else {
            Err(SlotError::OutOfRange {
                index,
                available: names.len(),
            })
        }
    };

    match spec {
        SlotSpec::Index(index) => check_index(*index),
        SlotSpec::Named(text) => {
            if let Ok(index) = text.parse::<usize>() {
                return check_index(index);
            }

            // Name and type are checked per slot, so an earlier slot's
            // type match outranks a later slot's name match.
            let wanted = text.to_lowercase();
            for (i, (name, dtype)) in names.iter().zip(types.iter()).enumerate() {
                if name.to_lowercase() == wanted || dtype.to_lowercase() == wanted {
                    return Ok(i);
                }
            }

            let available = names
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{}:{}", i, if name.is_empty() { "?" } else { name }))
                .join(", ");
            Err(SlotError::NoMatch {
                spec: text.clone(),
                available,
            })
        }
    }
}
