//! How hard do the Elves need to hit to win without losing anyone?

use tracing::info;

use crate::battle::{Battle, Faction, Outcome, DEFAULT_ATTACK_POWER, STARTING_HIT_POINTS};

/// The attack power at which an Elf kills any Goblin in `battle` with one
/// blow, so raising it further can't change how the battle goes. Never less
/// than a fresh unit's hit points.
pub fn max_attack_power(battle: &Battle) -> usize {
    battle
        .units()
        .iter()
        .filter(|u| u.faction == Faction::Goblin && u.is_alive())
        .map(|u| u.hit_points)
        .fold(STARTING_HIT_POINTS, usize::max)
}

/// The weakest Elf attack power that gives a flawless victory, and how that
/// battle went.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Boost {
    pub attack_power: usize,
    pub outcome: Outcome,
}

/// Find the lowest Elf attack power above the default at which the Elves win
/// `initial` without a single Elf dying. Return `None` if there is none.
///
/// More power doesn't always help: killing a Goblin sooner can open a path for
/// another one to reach a weaker Elf. So this tries every power in turn,
/// rather than bisecting.
pub fn minimum_elf_power(initial: &Battle) -> Option<Boost> {
    (DEFAULT_ATTACK_POWER + 1..=max_attack_power(initial)).find_map(|attack_power| {
        let outcome = flawless_victory(initial, attack_power)?;
        info!(attack_power, score = outcome.score(), "Elves win without losses");
        Some(Boost {
            attack_power,
            outcome,
        })
    })
}

/// Fight a copy of `initial` with the Elves hitting at `attack_power`. If the
/// Elves win without losing anyone, return the outcome. Give up as soon as an
/// Elf dies.
pub fn flawless_victory(initial: &Battle, attack_power: usize) -> Option<Outcome> {
    let mut battle = initial.clone();
    battle.set_attack_power(Faction::Elf, attack_power);
    let already_dead = battle.casualties(Faction::Elf);

    loop {
        let ended = battle.next_round();
        if battle.casualties(Faction::Elf) > already_dead {
            info!(attack_power, round = battle.rounds() + 1, "rejected: an Elf died");
            return None;
        }
        if ended || battle.is_stalemate() {
            let outcome = battle.outcome();
            if outcome.winner == Some(Faction::Elf) {
                return Some(outcome);
            }
            info!(attack_power, "rejected: Elves could not finish the Goblins off");
            return None;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn battle(rows: &[&str]) -> Battle {
        Battle::from_str(&rows.join("\n")).expect("parse test map")
    }

    fn first_example() -> Battle {
        battle(&[
            "#######",
            "#.G...#",
            "#...EG#",
            "#.#.#G#",
            "#..G#E#",
            "#.....#",
            "#######",
        ])
    }

    #[test]
    fn test_minimum_elf_power() {
        let initial = first_example();
        let boost = minimum_elf_power(&initial).expect("Elves can win");
        assert_eq!(boost.attack_power, 15);
        assert_eq!(
            boost.outcome,
            Outcome {
                rounds: 29,
                hit_points: 172,
                winner: Some(Faction::Elf),
            }
        );
        assert_eq!(boost.outcome.score(), 4988);

        // Trials never touch the original.
        assert_eq!(initial.rounds(), 0);
        assert_eq!(initial, first_example());
        assert!(initial.units().iter().all(|u| u.attack_power == 3));
    }

    #[test]
    fn test_one_less_loses_an_elf() {
        assert_eq!(flawless_victory(&first_example(), 14), None);

        let mut battle = first_example();
        battle.set_attack_power(Faction::Elf, 14);
        battle.fight(None);
        assert!(battle.casualties(Faction::Elf) > 0);
    }

    #[test]
    #[rustfmt::skip]
    fn test_examples() {
        fn power_and_score(rows: &[&str]) -> (usize, usize) {
            let boost = minimum_elf_power(&battle(rows)).expect("Elves can win");
            (boost.attack_power, boost.outcome.score())
        }

        assert_eq!(power_and_score(&["#######",
                                     "#E..EG#",
                                     "#.#G.E#",
                                     "#E.##E#",
                                     "#G..#.#",
                                     "#..E#.#",
                                     "#######"]), (4, 31284));

        assert_eq!(power_and_score(&["#######",
                                     "#E.G#.#",
                                     "#.#G..#",
                                     "#G.#.G#",
                                     "#G..#.#",
                                     "#...E.#",
                                     "#######"]), (15, 3478));

        assert_eq!(power_and_score(&["#######",
                                     "#.E...#",
                                     "#.#..G#",
                                     "#.###.#",
                                     "#E#G#G#",
                                     "#...#G#",
                                     "#######"]), (12, 6474));

        assert_eq!(power_and_score(&["#########",
                                     "#G......#",
                                     "#.E.#...#",
                                     "#..##..G#",
                                     "#...##..#",
                                     "#...#...#",
                                     "#.G...G.#",
                                     "#.....G.#",
                                     "#########"]), (34, 1140));
    }

    #[test]
    fn test_tough_goblin() {
        // Only a single blow of 250 saves the Elf.
        let initial = battle(&["####", "#EG#   E(3), G(250)", "####"]);
        assert_eq!(max_attack_power(&initial), 250);
        assert_eq!(flawless_victory(&initial, 249), None);
        assert_eq!(
            minimum_elf_power(&initial),
            Some(Boost {
                attack_power: 250,
                outcome: Outcome {
                    rounds: 1,
                    hit_points: 3,
                    winner: Some(Faction::Elf),
                },
            })
        );

        // Ordinary maps still stop at a fresh unit's hit points.
        assert_eq!(max_attack_power(&first_example()), STARTING_HIT_POINTS);
    }

    #[test]
    fn test_hopeless() {
        // The Elf can never reach the Goblin, so it never wins.
        let initial = battle(&["#########", "#E..#..G#", "#########"]);
        assert_eq!(flawless_victory(&initial, 50), None);
        assert_eq!(minimum_elf_power(&initial), None);
    }
}
