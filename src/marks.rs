// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::Rc;

/// Metadata attached to a value restricting how it may be used.
///
/// Marks never change the type of a value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
    Sensitive,
    Ephemeral,
    Custom(Rc<str>),
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Sensitive => f.write_str("sensitive"),
            Mark::Ephemeral => f.write_str("ephemeral"),
            Mark::Custom(name) => f.write_str(name),
        }
    }
}

impl FromStr for Mark {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim() {
            "" => bail!("mark name cannot be empty"),
            "sensitive" => Mark::Sensitive,
            "ephemeral" => Mark::Ephemeral,
            name => Mark::Custom(name.into()),
        })
    }
}

pub type Marks = BTreeSet<Mark>;
