use crate::models::{ParticipantAssignment, Technique};

use super::capacity::{CapacityLimits, TechniqueCounts};

#[derive(Debug, Clone, Copy)]
pub struct GroupConfig {
    pub min_participants: u32,
    pub max_participants: u32,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            max_participants: 24,
        }
    }
}

// Group experiences never run for one person, whatever the product config says.
const GROUP_FLOOR: u32 = 2;

#[derive(Debug, PartialEq)]
pub enum GroupError {
    OutOfRange {
        total: u32,
        min: u32,
        max: u32,
    },
    CapacityExceeded {
        technique: Technique,
        count: u32,
        limit: u32,
    },
    MissingPiece {
        participant: u32,
    },
    CountMismatch {
        total: u32,
        assigned: u32,
    },
}

impl std::fmt::Display for GroupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupError::OutOfRange { total, min, max } => {
                if total < min {
                    write!(f, "los grupos requieren un mínimo de {min} personas")
                } else {
                    write!(f, "el máximo para esta experiencia es de {max} personas")
                }
            }
            GroupError::CapacityExceeded {
                technique,
                count,
                limit,
            } => write!(
                f,
                "sin capacidad en {}: {count} asignados, límite {limit}",
                technique.label()
            ),
            GroupError::MissingPiece { participant } => write!(
                f,
                "el participante {participant} debe elegir una pieza para pintar"
            ),
            GroupError::CountMismatch { total, assigned } => write!(
                f,
                "el grupo es de {total} personas pero hay {assigned} técnicas asignadas"
            ),
        }
    }
}

pub fn validate_group(
    total_participants: u32,
    assignments: &[ParticipantAssignment],
    config: &GroupConfig,
    limits: &CapacityLimits,
) -> Result<(), GroupError> {
    let min = config.min_participants.max(GROUP_FLOOR);
    if total_participants < min || total_participants > config.max_participants {
        return Err(GroupError::OutOfRange {
            total: total_participants,
            min,
            max: config.max_participants,
        });
    }

    if assignments.len() as u32 != total_participants {
        return Err(GroupError::CountMismatch {
            total: total_participants,
            assigned: assignments.len() as u32,
        });
    }

    let mut counts = TechniqueCounts::default();
    for assignment in assignments {
        counts.add(assignment.technique, 1);
    }
    for technique in Technique::ALL {
        let count = counts.get(technique);
        let limit = limits.for_technique(technique);
        if count > limit {
            return Err(GroupError::CapacityExceeded {
                technique,
                count,
                limit,
            });
        }
    }

    for assignment in assignments {
        if assignment.technique == Technique::Painting
            && assignment
                .selected_piece_id
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(GroupError::MissingPiece {
                participant: assignment.participant_number,
            });
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Balanced,
    AllModeling,
    AllWheel,
    HalfWheel,
}

impl Preset {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "balanced" => Some(Preset::Balanced),
            "all_modeling" => Some(Preset::AllModeling),
            "all_wheel" => Some(Preset::AllWheel),
            "half_wheel" => Some(Preset::HalfWheel),
            _ => None,
        }
    }
}

// Deterministic technique distributions for the group form. Participants are
// numbered 1..=n in order; painting assignments start with no piece selected.
pub fn apply_preset(preset: Preset, total_participants: u32, limits: &CapacityLimits) -> Vec<ParticipantAssignment> {
    let techniques: Vec<Technique> = match preset {
        Preset::Balanced => {
            let wheel = total_participants.min(limits.potters_wheel);
            let modeling = (total_participants - wheel).min(limits.hand_modeling);
            let painting = total_participants - wheel - modeling;
            std::iter::repeat(Technique::PottersWheel)
                .take(wheel as usize)
                .chain(std::iter::repeat(Technique::HandModeling).take(modeling as usize))
                .chain(std::iter::repeat(Technique::Painting).take(painting as usize))
                .collect()
        }
        Preset::AllModeling => vec![Technique::HandModeling; total_participants as usize],
        Preset::AllWheel => vec![Technique::PottersWheel; total_participants as usize],
        Preset::HalfWheel => {
            let wheel = total_participants.div_ceil(2);
            let modeling = total_participants - wheel;
            std::iter::repeat(Technique::PottersWheel)
                .take(wheel as usize)
                .chain(std::iter::repeat(Technique::HandModeling).take(modeling as usize))
                .collect()
        }
    };

    techniques
        .into_iter()
        .enumerate()
        .map(|(i, technique)| ParticipantAssignment {
            participant_number: i as u32 + 1,
            technique,
            selected_piece_id: None,
        })
        .collect()
}
