use std::collections::BTreeMap;

use medusa_tower_core::{
    normalize_words, ActionError, Event, Message, PieceId, PieceRecord, PuzzleRecord, SetId,
    SetRecord, Tile,
};

use crate::{
    tower::{PieceDefinition, PuzzleSetDefinition},
    World,
};

#[derive(Clone, Debug)]
struct PieceProgress {
    definition: PieceDefinition,
    set: SetId,
    unlocked: bool,
    answer: Option<String>,
}

#[derive(Clone, Debug)]
struct SetProgress {
    definition: PuzzleSetDefinition,
    unlocked: bool,
}

/// Unlock and answer progress of the puzzle catalogue.
#[derive(Clone, Debug, Default)]
pub(crate) struct PuzzleBook {
    pieces: BTreeMap<PieceId, PieceProgress>,
    sets: BTreeMap<SetId, SetProgress>,
}

impl PuzzleBook {
    pub(crate) fn from_definitions(definitions: &[PuzzleSetDefinition]) -> Self {
        let mut book = Self::default();
        for set in definitions {
            for piece in set.pieces {
                let _ = book.pieces.insert(
                    piece.id,
                    PieceProgress {
                        definition: *piece,
                        set: set.id,
                        unlocked: false,
                        answer: None,
                    },
                );
            }
            let _ = book.sets.insert(
                set.id,
                SetProgress {
                    definition: *set,
                    unlocked: false,
                },
            );
        }
        book
    }

    pub(crate) fn is_piece_unlocked(&self, piece: PieceId) -> bool {
        self.pieces.get(&piece).is_some_and(|progress| progress.unlocked)
    }

    pub(crate) fn is_set_unlocked(&self, set: SetId) -> bool {
        self.sets.get(&set).is_some_and(|progress| progress.unlocked)
    }

    pub(crate) fn solved_answer(&self, piece: PieceId) -> Option<&str> {
        self.pieces
            .get(&piece)
            .and_then(|progress| progress.answer.as_deref())
    }

    pub(crate) fn set_definition(&self, set: SetId) -> Option<&PuzzleSetDefinition> {
        self.sets.get(&set).map(|progress| &progress.definition)
    }

    /// Checks an answer and unlocks the piece on success.
    ///
    /// Returns the piece's set and whether that set is unlocked afterwards.
    fn answer(&mut self, piece: PieceId, raw: &str) -> Result<(SetId, bool), ActionError> {
        let progress = self
            .pieces
            .get_mut(&piece)
            .ok_or(ActionError::NothingToInteract)?;
        if progress.unlocked {
            return Err(ActionError::NothingToInteract);
        }
        let typed = normalize_words(raw);
        let accepted = progress
            .definition
            .answers
            .iter()
            .any(|answer| normalize_words(answer) == typed);
        if typed.is_empty() || !accepted {
            return Err(ActionError::WrongAnswer);
        }
        progress.unlocked = true;
        progress.answer = Some(typed);
        let set = progress.set;
        self.refresh_set(set);
        Ok((set, self.is_set_unlocked(set)))
    }

    /// A set unlocks with its first piece, or with its last one for whole-set puzzles.
    fn refresh_set(&mut self, set: SetId) {
        let mut pieces = self
            .pieces
            .values()
            .filter(|progress| progress.set == set)
            .map(|progress| progress.unlocked);
        let Some(progress) = self.sets.get_mut(&set) else {
            return;
        };
        progress.unlocked = if progress.definition.whole_set {
            pieces.all(|unlocked| unlocked)
        } else {
            pieces.any(|unlocked| unlocked)
        };
    }

    pub(crate) fn to_record(&self) -> PuzzleRecord {
        PuzzleRecord {
            pieces: self
                .pieces
                .iter()
                .map(|(id, progress)| PieceRecord {
                    id: *id,
                    unlocked: progress.unlocked,
                    answer: progress.answer.clone(),
                })
                .collect(),
            sets: self
                .sets
                .iter()
                .map(|(id, progress)| SetRecord {
                    id: *id,
                    unlocked: progress.unlocked,
                })
                .collect(),
        }
    }

    /// Restores recorded progress. Unknown pieces are skipped and set flags are recomputed.
    pub(crate) fn restore(&mut self, record: &PuzzleRecord) {
        for progress in self.pieces.values_mut() {
            progress.unlocked = false;
            progress.answer = None;
        }
        for entry in &record.pieces {
            match self.pieces.get_mut(&entry.id) {
                Some(progress) => {
                    progress.unlocked = entry.unlocked;
                    progress.answer = entry.answer.clone();
                }
                None => log::warn!("saved puzzle piece {:?} is unknown", entry.id),
            }
        }
        let sets: Vec<SetId> = self.sets.keys().copied().collect();
        for set in sets {
            self.refresh_set(set);
        }
        for entry in &record.sets {
            if entry.unlocked != self.is_set_unlocked(entry.id) {
                log::warn!(
                    "saved unlock flag of puzzle set {:?} disagrees with its pieces",
                    entry.id
                );
            }
        }
    }
}

impl World {
    pub(crate) fn answer_puzzle(
        &mut self,
        piece: PieceId,
        answer: &str,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        let (set, set_unlocked) = self.puzzles.answer(piece, answer)?;
        log::info!("puzzle piece {} solved", piece.get());

        for floor in self.grid.floors().collect::<Vec<_>>() {
            for position in self.grid.find(floor, |tile| tile == Tile::PuzzlePiece(piece)) {
                if self.grid.set_tile(position, Tile::Floor) {
                    out_events.push(Event::TileChanged {
                        position,
                        tile: Tile::Floor,
                    });
                }
            }
        }
        out_events.push(Event::PuzzleStateChanged {
            piece,
            set,
            set_unlocked,
        });
        self.show_message(Message::PuzzleSolved(piece), out_events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tower::Tower;

    fn book() -> PuzzleBook {
        PuzzleBook::from_definitions(&Tower::canonical().puzzle_sets)
    }

    #[test]
    fn answers_are_width_and_case_insensitive() {
        let mut book = book();
        let piece = PieceId::new(21);
        assert_eq!(
            book.answer(piece, "window"),
            Err(ActionError::WrongAnswer)
        );
        assert!(!book.is_piece_unlocked(piece));

        assert_eq!(book.answer(piece, " ＭＩＲＲＯＲ "), Ok((SetId::new(2), true)));
        assert_eq!(book.solved_answer(piece), Some("mirror"));
        assert_eq!(
            book.answer(piece, "mirror"),
            Err(ActionError::NothingToInteract),
            "a solved piece cannot be answered twice"
        );
    }

    #[test]
    fn whole_set_unlocks_with_its_last_piece() {
        let mut book = book();
        let set = SetId::new(5);
        assert_eq!(book.answer(PieceId::new(51), "scale"), Ok((set, false)));
        assert_eq!(book.answer(PieceId::new(52), "fang"), Ok((set, false)));
        assert!(!book.is_set_unlocked(set));
        assert_eq!(book.answer(PieceId::new(53), "Coil"), Ok((set, true)));
        assert!(book.is_set_unlocked(set));
    }

    #[test]
    fn restore_recomputes_set_flags() {
        let mut solved = book();
        let _ = solved.answer(PieceId::new(22), "echo").expect("echo");
        let record = solved.to_record();

        let mut restored = book();
        restored.restore(&record);
        assert!(restored.is_piece_unlocked(PieceId::new(22)));
        assert!(restored.is_set_unlocked(SetId::new(2)));
        assert!(!restored.is_set_unlocked(SetId::new(5)));
        assert_eq!(restored.to_record(), record);
    }

    #[test]
    fn empty_record_resets_progress() {
        let mut book = book();
        let _ = book.answer(PieceId::new(21), "reflection").expect("reflection");
        book.restore(&PuzzleRecord::default());
        assert!(!book.is_piece_unlocked(PieceId::new(21)));
        assert!(!book.is_set_unlocked(SetId::new(2)));
    }
}
