//! Board-level types: Container, Item and their kinds

use super::ids::{ContainerId, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a container is, which decides what it may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// A board holds columns
    Board,
    /// A column holds cards
    Column,
}

impl ContainerKind {
    /// The kind of item this container accepts
    pub fn item_kind(self) -> ItemKind {
        match self {
            Self::Board => ItemKind::Column,
            Self::Column => ItemKind::Card,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Column => "column",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "board" => Ok(Self::Board),
            "column" => Ok(Self::Column),
            other => Err(format!("unknown container kind '{}'", other)),
        }
    }
}

/// What an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Card,
    Column,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Column => "column",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "column" => Ok(Self::Column),
            other => Err(format!("unknown item kind '{}'", other)),
        }
    }
}

/// An ordered grouping of items. Owns the ordering of everything inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub kind: ContainerKind,
    pub name: String,
}

impl Container {
    /// Create a new container
    pub fn new(id: impl Into<ContainerId>, kind: ContainerKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
        }
    }

    /// Whether this container may hold an item of the given kind
    pub fn accepts(&self, kind: ItemKind) -> bool {
        self.kind.item_kind() == kind
    }
}

/// A movable item: belongs to exactly one container at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub container_id: ContainerId,
    pub kind: ItemKind,
    pub title: String,
    pub position: usize,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new item; its position is assigned when it is inserted
    pub fn new(
        id: impl Into<ItemId>,
        container_id: impl Into<ContainerId>,
        kind: ItemKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            container_id: container_id.into(),
            kind,
            title: title.into(),
            position: 0,
            updated_at: Utc::now(),
        }
    }

    /// Set the position
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}
