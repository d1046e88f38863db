use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    PottersWheel,
    HandModeling,
    Painting,
}

impl Technique {
    pub const ALL: [Technique; 3] = [
        Technique::PottersWheel,
        Technique::HandModeling,
        Technique::Painting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::PottersWheel => "potters_wheel",
            Technique::HandModeling => "hand_modeling",
            Technique::Painting => "painting",
        }
    }

    // Strict on purpose: an unknown literal must surface as an error at the
    // API boundary instead of silently landing in a default pool.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "potters_wheel" => Some(Technique::PottersWheel),
            "hand_modeling" => Some(Technique::HandModeling),
            "painting" => Some(Technique::Painting),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Technique::PottersWheel => "torno alfarero",
            Technique::HandModeling => "modelado a mano",
            Technique::Painting => "pintura",
        }
    }
}
