//! Mutation validator
//!
//! Applies a [`StateUpdate`] field by field in the deployed order. Out-of-range
//! numbers are clamped; only `sv` and `bo` can reject. A rejection stops the
//! update at that field: fields earlier in the order stay applied, the failing
//! field and everything after it are left untouched.

use super::model::{
    clamp_to_u8, truncate_name, BestOf, LogEntry, MatchState, Team, ROTATION_SLOTS, SCORE_RANGE,
    SERVER_SLOT_RANGE, SETS_WON_RANGE, SET_NUMBER_RANGE,
};
use crate::error::ValidationError;
use crate::protocol::StateUpdate;

/// Result of a successful (or partially successful) application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Fields written, including writes that stored the same value
    pub fields_applied: usize,
    /// Whether any written field changed the state
    pub changed: bool,
}

impl ApplyOutcome {
    fn write<T: PartialEq>(&mut self, slot: &mut T, value: T) {
        self.fields_applied += 1;
        if *slot != value {
            *slot = value;
            self.changed = true;
        }
    }
}

/// A rejected update, with whatever was applied before the failing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// The hard validation failure
    pub error: ValidationError,
    /// Fields applied before the failure
    pub partial: ApplyOutcome,
}

/// Apply `update` to `state`
pub fn apply_update(state: &mut MatchState, update: &StateUpdate) -> Result<ApplyOutcome, Rejected> {
    let mut out = ApplyOutcome::default();

    for (team, name) in [(Team::A, &update.team_a_name), (Team::B, &update.team_b_name)] {
        if let Some(name) = name {
            out.write(&mut state.team_mut(team).name, truncate_name(name));
        }
    }
    for (team, color) in [(Team::A, &update.team_a_color), (Team::B, &update.team_b_color)] {
        if let Some(color) = color {
            out.write(&mut state.team_mut(team).color, color.clone());
        }
    }
    for (team, bg) in [
        (Team::A, &update.team_a_background),
        (Team::B, &update.team_b_background),
    ] {
        if let Some(bg) = bg {
            out.write(&mut state.team_mut(team).background, bg.clone());
        }
    }
    for (team, score) in [(Team::A, update.team_a_score), (Team::B, update.team_b_score)] {
        if let Some(score) = score {
            out.write(&mut state.team_mut(team).score, clamp_to_u8(score, SCORE_RANGE));
        }
    }

    if let Some(code) = &update.serving {
        match Team::from_code(code) {
            Some(team) => out.write(&mut state.serving, team),
            None => {
                return Err(Rejected {
                    error: ValidationError::InvalidServing(code.clone()),
                    partial: out,
                })
            }
        }
    }

    for (team, labels) in [
        (Team::A, &update.team_a_rotation),
        (Team::B, &update.team_b_rotation),
    ] {
        if let Some(labels) = labels {
            out.write(&mut state.team_mut(team).rotation, rotation_from(labels));
        }
    }
    for (team, slot) in [
        (Team::A, update.team_a_server_slot),
        (Team::B, update.team_b_server_slot),
    ] {
        if let Some(slot) = slot {
            out.write(
                &mut state.team_mut(team).server_slot,
                clamp_to_u8(slot, SERVER_SLOT_RANGE),
            );
        }
    }
    for (team, events) in [(Team::A, &update.team_a_events), (Team::B, &update.team_b_events)] {
        if let Some(events) = events {
            apply_events(&mut out, state, team, events);
        }
    }

    if let Some(set) = update.set_number {
        out.write(&mut state.set_number, clamp_to_u8(set, SET_NUMBER_RANGE));
    }
    for (team, won) in [
        (Team::A, update.team_a_sets_won),
        (Team::B, update.team_b_sets_won),
    ] {
        if let Some(won) = won {
            out.write(&mut state.team_mut(team).sets_won, clamp_to_u8(won, SETS_WON_RANGE));
        }
    }

    if let Some(sets) = update.best_of {
        match BestOf::from_sets(sets) {
            Some(best_of) => out.write(&mut state.best_of, best_of),
            None => {
                return Err(Rejected {
                    error: ValidationError::InvalidBestOf(sets),
                    partial: out,
                })
            }
        }
    }

    Ok(out)
}

fn rotation_from(labels: &[String]) -> [String; ROTATION_SLOTS] {
    std::array::from_fn(|i| labels.get(i).cloned().unwrap_or_default())
}

fn apply_events(out: &mut ApplyOutcome, state: &mut MatchState, team: Team, events: &[LogEntry]) {
    let recent = &mut state.team_mut(team).recent;
    let before = recent.clone();
    recent.replace_with_tail(events);
    out.fields_applied += 1;
    if *recent != before {
        out.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: u32) -> Vec<LogEntry> {
        (1..=n)
            .map(|i| LogEntry::new(format!("point-{}", i), i.to_string(), u64::from(i) * 100))
            .collect()
    }

    #[test]
    fn test_scores_clamp() {
        let mut state = MatchState::new();

        let outcome = apply_update(&mut state, &StateUpdate::new().with_scores(150, -4)).unwrap();

        assert_eq!(state.team(Team::A).score, 99);
        assert_eq!(state.team(Team::B).score, 0);
        assert_eq!(outcome.fields_applied, 2);
        assert!(outcome.changed);
    }

    #[test]
    fn test_ranges_clamp() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            set_number: Some(0),
            team_a_sets_won: Some(12),
            team_b_sets_won: Some(-1),
            team_a_server_slot: Some(6),
            team_b_server_slot: Some(-9),
            ..Default::default()
        };

        apply_update(&mut state, &update).unwrap();

        assert_eq!(state.set_number, 1);
        assert_eq!(state.team(Team::A).sets_won, 9);
        assert_eq!(state.team(Team::B).sets_won, 0);
        assert_eq!(state.team(Team::A).server_slot, 5);
        assert_eq!(state.team(Team::B).server_slot, 0);

        apply_update(&mut state, &StateUpdate { set_number: Some(42), ..Default::default() }).unwrap();
        assert_eq!(state.set_number, 9);
    }

    #[test]
    fn test_invalid_serving_rejected() {
        let mut state = MatchState::new();

        for bad in ["C", "", "a", "AB"] {
            let err = apply_update(&mut state, &StateUpdate::new().with_serving(bad)).unwrap_err();
            assert_eq!(err.error, ValidationError::InvalidServing(bad.into()));
            assert_eq!(state.serving, Team::A);
        }
        assert_eq!(
            ValidationError::InvalidServing("C".into()).to_string(),
            "sv must be 'A' or 'B'"
        );
    }

    #[test]
    fn test_invalid_best_of_rejected() {
        let mut state = MatchState::new();

        for bad in [0, 1, 2, 4, 6, -3] {
            let err = apply_update(&mut state, &StateUpdate::new().with_best_of(bad)).unwrap_err();
            assert_eq!(err.error, ValidationError::InvalidBestOf(bad));
            assert_eq!(state.best_of, BestOf::Three);
        }

        apply_update(&mut state, &StateUpdate::new().with_best_of(5)).unwrap();
        assert_eq!(state.best_of, BestOf::Five);
    }

    #[test]
    fn test_failure_keeps_earlier_fields_only() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            team_a_name: Some("Eagles".into()),
            team_a_score: Some(3),
            serving: Some("X".into()),
            team_a_rotation: Some(vec!["1".into()]),
            set_number: Some(2),
            best_of: Some(5),
            ..Default::default()
        };

        let err = apply_update(&mut state, &update).unwrap_err();

        // Before `sv` in application order
        assert_eq!(state.team(Team::A).name, "Eagles");
        assert_eq!(state.team(Team::A).score, 3);
        assert_eq!(err.partial.fields_applied, 2);
        assert!(err.partial.changed);
        // `sv` and after
        assert_eq!(state.serving, Team::A);
        assert_eq!(state.team(Team::A).rotation[0], "");
        assert_eq!(state.set_number, 1);
        assert_eq!(state.best_of, BestOf::Three);
    }

    #[test]
    fn test_best_of_failure_is_last_in_order() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            set_number: Some(3),
            team_b_sets_won: Some(2),
            ..StateUpdate::new().with_serving("B").with_best_of(7)
        };

        let err = apply_update(&mut state, &update).unwrap_err();

        assert_eq!(err.error, ValidationError::InvalidBestOf(7));
        assert_eq!(state.serving, Team::B);
        assert_eq!(state.set_number, 3);
        assert_eq!(state.team(Team::B).sets_won, 2);
        assert_eq!(state.best_of, BestOf::Three);
    }

    #[test]
    fn test_names_truncate() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            team_b_name: Some("The Extremely Long Volleyball Club".into()),
            ..Default::default()
        };

        apply_update(&mut state, &update).unwrap();

        assert_eq!(state.team(Team::B).name, "The Extremely Long V");
    }

    #[test]
    fn test_colors_stored_verbatim() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            team_a_color: Some("not-a-color".into()),
            team_b_background: Some("123456".into()),
            ..Default::default()
        };

        apply_update(&mut state, &update).unwrap();

        assert_eq!(state.team(Team::A).color, "not-a-color");
        assert_eq!(state.team(Team::B).background, "123456");
    }

    #[test]
    fn test_rotation_pads_and_truncates() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            team_a_rotation: Some(vec!["1".into(), "2".into()]),
            team_b_rotation: Some((1..=8).map(|i| i.to_string()).collect()),
            ..Default::default()
        };

        apply_update(&mut state, &update).unwrap();

        assert_eq!(state.team(Team::A).rotation, ["1", "2", "", "", "", ""]);
        assert_eq!(state.team(Team::B).rotation, ["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn test_recent_events_keep_last_four() {
        let mut state = MatchState::new();
        let supplied = entries(5);
        let update = StateUpdate {
            team_a_events: Some(supplied.clone()),
            ..Default::default()
        };

        apply_update(&mut state, &update).unwrap();

        let recent = &state.team(Team::A).recent;
        assert_eq!(recent.len(), 4);
        assert_eq!(recent.entries(), &supplied[1..5]);
        assert!(state.team(Team::B).recent.is_empty());
    }

    #[test]
    fn test_unchanged_write_reports_not_changed() {
        let mut state = MatchState::new();
        let update = StateUpdate {
            team_a_name: Some("Team A".into()),
            ..StateUpdate::new().with_scores(0, 0)
        };

        let outcome = apply_update(&mut state, &update).unwrap();

        assert_eq!(outcome.fields_applied, 3);
        assert!(!outcome.changed);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut state = MatchState::new();
        let outcome = apply_update(&mut state, &StateUpdate::new()).unwrap();

        assert_eq!(outcome, ApplyOutcome::default());
        assert_eq!(state, MatchState::new());
    }

    #[test]
    fn test_reference_scenario() {
        let mut state = MatchState::new();

        apply_update(&mut state, &StateUpdate { team_a_score: Some(150), ..Default::default() })
            .unwrap();
        assert_eq!(state.team(Team::A).score, 99);

        assert!(apply_update(&mut state, &StateUpdate::new().with_serving("C")).is_err());
        assert_eq!(state.serving, Team::A);

        assert!(apply_update(&mut state, &StateUpdate::new().with_best_of(4)).is_err());
        assert_eq!(state.best_of.sets(), 3);

        let supplied = entries(5);
        apply_update(
            &mut state,
            &StateUpdate { team_a_events: Some(supplied.clone()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(state.team(Team::A).recent.len(), 4);
        assert_eq!(state.team(Team::A).recent.entries(), &supplied[1..]);
    }
}
