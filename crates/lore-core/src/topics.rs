//! Static topic catalog.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

pub const DEFAULT_TOPIC: &str = "natural_health";

const TOPICS: &[Topic] = &[
    Topic {
        id: "natural_health",
        name: "Natural Health",
        description: "Traditional remedies and natural healing",
        icon: "🌿",
        color: "emerald",
    },
    Topic {
        id: "lost_history",
        name: "Lost History",
        description: "Forgotten civilizations and alternative history",
        icon: "🏛️",
        color: "amber",
    },
    Topic {
        id: "apocrypha",
        name: "Apocrypha",
        description: "Non-canonical religious texts",
        icon: "📜",
        color: "violet",
    },
];

pub fn topics() -> &'static [Topic] {
    TOPICS
}

pub fn find_topic(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|t| t.id == id)
}
