use std::fmt;

/// A parsed (owner, repo, number) pointer to one tracker item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// The tracker record a reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerItem {
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub state: ItemState,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Open,
    Closed,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Open => write!(f, "open"),
            ItemState::Closed => write!(f, "closed"),
        }
    }
}

/// A completed response payload, ready for the rendering layer.
///
/// The footer's trailing line carries the requesting user's id so a later
/// reaction event can verify withdrawal permission without any stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCard {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<CardField>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl CardField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}
