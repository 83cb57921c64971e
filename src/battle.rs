//! Goblins and Elves fighting it out in a cave.
//!
//! Each round, every unit takes a turn in reading order: it picks the
//! nearest square from which it could attack an enemy, takes one step toward
//! it, and then attacks the weakest enemy beside it, if any. Combat ends when
//! some unit starts its turn with no enemies left anywhere.

use failure::Error;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::flood::flood_fill;
use crate::grid::Grid;
use crate::search::{shortest_path, Path, SearchSpace};
use crate::{Manhattan, Point};

pub const STARTING_HIT_POINTS: usize = 200;
pub const DEFAULT_ATTACK_POWER: usize = 3;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Faction {
    Goblin,
    Elf,
}

impl Faction {
    pub fn is_enemy(self, other: Faction) -> bool {
        self != other
    }

    pub fn symbol(self) -> char {
        match self {
            Faction::Elf => 'E',
            Faction::Goblin => 'G',
        }
    }

    fn from_symbol(ch: char) -> Option<Faction> {
        match ch {
            'E' => Some(Faction::Elf),
            'G' => Some(Faction::Goblin),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Cell {
    Wall,
    Floor,
    /// Occupied by the living unit at this index in `Battle::units`.
    Unit(usize),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unit {
    pub faction: Faction,
    pub position: Point,
    pub hit_points: usize,
    pub attack_power: usize,
}

impl Unit {
    fn new(faction: Faction, position: Point) -> Unit {
        Unit {
            faction,
            position,
            hit_points: STARTING_HIT_POINTS,
            attack_power: DEFAULT_ATTACK_POWER,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}({})@{}", self.faction.symbol(), self.hit_points, self.position)
    }
}

/// How a battle turned out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
    /// The number of rounds that ran to completion.
    pub rounds: usize,

    /// The total hit points of all units still standing.
    pub hit_points: usize,

    /// The faction left standing, or `None` if both still are.
    pub winner: Option<Faction>,
}

impl Outcome {
    pub fn score(&self) -> usize {
        self.rounds * self.hit_points
    }
}

/// The squares a unit could walk to, and how many steps each would take.
pub struct Reach(Grid<Option<usize>>);

impl Reach {
    pub fn contains(&self, p: Point) -> bool {
        self.distance(p).is_some()
    }

    pub fn distance(&self, p: Point) -> Option<usize> {
        self.0.get(p).and_then(|d| *d)
    }
}

/// The state of a battle: the cave, and everyone in it.
///
/// Cloning a `Battle` copies everything, so a clone can be fought to the end
/// without disturbing the original.
#[derive(Clone)]
pub struct Battle {
    cells: Grid<Cell>,

    /// Every unit that was ever in the battle. Dead units stay here, but have
    /// no cell. At the start of each round the living units are sorted into
    /// reading order, ahead of the dead.
    units: Vec<Unit>,

    /// Rounds completed so far.
    rounds: usize,

    /// True if the most recent full round saw nobody move or attack. Since the
    /// battle is deterministic, nothing will ever happen again.
    stalemate: bool,
}

/// What happened on a unit's turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Turn {
    /// There were no enemies at all: combat is over.
    NoTargets,
    /// Nowhere to go, and nobody to hit.
    Idle,
    Acted,
}

impl Battle {
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn is_stalemate(&self) -> bool {
        self.stalemate
    }

    pub fn unit_at(&self, p: Point) -> Option<&Unit> {
        self.index_at(p).map(|i| &self.units[i])
    }

    fn index_at(&self, p: Point) -> Option<usize> {
        match self.cells.get(p) {
            Some(&Cell::Unit(index)) => Some(index),
            _ => None,
        }
    }

    /// The number of living units in `faction`.
    pub fn living(&self, faction: Faction) -> usize {
        self.units
            .iter()
            .filter(|u| u.faction == faction && u.is_alive())
            .count()
    }

    /// The number of units in `faction` that have died.
    pub fn casualties(&self, faction: Faction) -> usize {
        self.units
            .iter()
            .filter(|u| u.faction == faction && !u.is_alive())
            .count()
    }

    pub fn set_attack_power(&mut self, faction: Faction, attack_power: usize) {
        for unit in self.units.iter_mut().filter(|u| u.faction == faction) {
            unit.attack_power = attack_power;
        }
    }

    pub fn remaining_hit_points(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| u.hit_points)
            .sum()
    }

    pub fn outcome(&self) -> Outcome {
        let winner = match (self.living(Faction::Elf), self.living(Faction::Goblin)) {
            (0, 0) => None,
            (0, _) => Some(Faction::Goblin),
            (_, 0) => Some(Faction::Elf),
            _ => None,
        };
        Outcome {
            rounds: self.rounds,
            hit_points: self.remaining_hit_points(),
            winner,
        }
    }

    /// Run combat until it ends, or until `max_rounds` rounds have been
    /// completed, or until nothing can change any more.
    pub fn fight(&mut self, max_rounds: Option<usize>) -> Outcome {
        while max_rounds.map_or(true, |max| self.rounds < max) {
            if self.next_round() || self.stalemate {
                break;
            }
        }
        self.outcome()
    }

    /// Run a round of combat. Return true if combat ended partway through,
    /// in which case the round doesn't count as completed.
    pub fn next_round(&mut self) -> bool {
        self.sort_units();
        debug!(
            round = self.rounds + 1,
            elves = self.living(Faction::Elf),
            goblins = self.living(Faction::Goblin),
            "round begins"
        );

        let mut anything_happened = false;
        for index in 0..self.units.len() {
            // The unit might have been killed earlier in this round.
            if !self.units[index].is_alive() {
                continue;
            }
            match self.take_turn(index) {
                Turn::NoTargets => return true,
                Turn::Idle => (),
                Turn::Acted => anything_happened = true,
            }
        }

        self.rounds += 1;
        self.stalemate = !anything_happened;
        false
    }

    /// Put the living units in reading order, and point their cells at their
    /// new indices.
    fn sort_units(&mut self) {
        self.units.sort_by_key(|u| (!u.is_alive(), u.position));
        for (index, unit) in self.units.iter().enumerate() {
            if unit.is_alive() {
                self.cells[unit.position] = Cell::Unit(index);
            }
        }
    }

    fn take_turn(&mut self, index: usize) -> Turn {
        let faction = self.units[index].faction;
        let targets = self
            .units
            .iter()
            .filter(|u| u.is_alive() && faction.is_enemy(u.faction))
            .map(|u| u.position)
            .collect::<Vec<_>>();
        if targets.is_empty() {
            trace!(unit = %self.units[index], "no targets remain");
            return Turn::NoTargets;
        }

        let mut turn = Turn::Idle;
        if let Some(path) = self.plan_move(self.units[index].position, &targets) {
            if let Some(&step) = path.first_step() {
                trace!(unit = %self.units[index], to = %step, "moves");
                self.move_unit(index, step);
                turn = Turn::Acted;
            }
        }

        if let Some(target) = self.select_target(index) {
            self.attack(index, target);
            turn = Turn::Acted;
        }
        turn
    }

    /// Every open square the unit at `from` could walk to, along with its
    /// distance. Walls and other units block the way. The unit's own square
    /// is included, at distance zero.
    pub fn reachable(&self, from: Point) -> Reach {
        let mut reach = Grid::from_fn(self.cells.width(), self.cells.height(), |_| None);
        for (p, distance) in flood_fill(from, |&p| self.open_neighbors(p)) {
            reach[p] = Some(distance);
        }
        Reach(reach)
    }

    /// The squares adjacent to any of `targets` that `reach` includes: the
    /// places from which a unit could attack. Each appears once.
    pub fn destinations(&self, reach: &Reach, targets: &[Point]) -> Vec<Point> {
        targets
            .iter()
            .flat_map(|&t| self.cells.neighbors(t))
            .filter(|&p| reach.contains(p))
            .unique()
            .collect()
    }

    /// Choose where the unit at `from` should head to attack one of
    /// `targets`, and the path it should take to get there.
    ///
    /// The destination is the nearest square in range of some target, taking
    /// the first in reading order if there's a tie. The path's first step is
    /// the first square in reading order that begins a shortest path to it.
    /// If the unit is already in range, the path is empty. If no square in
    /// range is reachable, return `None`.
    pub fn plan_move(&self, from: Point, targets: &[Point]) -> Option<Path<Point, usize>> {
        let reach = self.reachable(from);
        let chosen = self
            .destinations(&reach, targets)
            .into_iter()
            .filter_map(|d| reach.distance(d).map(|distance| (distance, d)))
            .min()?
            .1;
        if chosen == from {
            return Some(Path {
                nodes: vec![],
                cost: 0,
            });
        }

        // The search from each candidate step settles the distance, and
        // `min_by_key` keeps the first of any equals, which is the first in
        // reading order.
        let footing = Footing(self);
        let (step, rest) = self
            .open_neighbors(from)
            .filter_map(|step| shortest_path(&footing, step, &[chosen]).map(|rest| (step, rest)))
            .min_by_key(|(_, rest)| rest.cost)?;
        trace!(from = %from, destination = %chosen, step = %step, "path chosen");

        let mut nodes = vec![step];
        nodes.extend(rest.nodes);
        Some(Path {
            nodes,
            cost: rest.cost + 1,
        })
    }

    fn move_unit(&mut self, index: usize, to: Point) {
        assert_eq!(self.cells[to], Cell::Floor, "unit moving into occupied square");
        let from = self.units[index].position;
        self.cells[from] = Cell::Floor;
        self.cells[to] = Cell::Unit(index);
        self.units[index].position = to;
    }

    /// Choose the enemy for the unit at `index` to attack: the adjacent enemy
    /// with the fewest hit points, taking the first in reading order among
    /// equals.
    fn select_target(&self, index: usize) -> Option<usize> {
        let attacker = &self.units[index];
        let mut target: Option<usize> = None;
        for p in self.cells.neighbors(attacker.position) {
            let candidate = match self.index_at(p) {
                Some(candidate) => candidate,
                None => continue,
            };
            if !attacker.faction.is_enemy(self.units[candidate].faction) {
                continue;
            }
            match target {
                Some(t) if self.units[t].hit_points <= self.units[candidate].hit_points => (),
                _ => target = Some(candidate),
            }
        }
        target
    }

    fn attack(&mut self, attacker: usize, target: usize) {
        let power = self.units[attacker].attack_power;
        let victim = &mut self.units[target];
        victim.hit_points = victim.hit_points.saturating_sub(power);
        trace!(attacker = %self.units[attacker], victim = %self.units[target], "attacks");

        if !self.units[target].is_alive() {
            let position = self.units[target].position;
            self.cells[position] = Cell::Floor;
            trace!(victim = %self.units[target], "dies");
        }
    }

    /// Squares next to `p` that a unit could step into, in reading order.
    fn open_neighbors(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        self.cells
            .neighbors(p)
            .filter(move |&n| self.cells[n] == Cell::Floor)
    }
}

/// The cave floor as seen by a unit looking for a path: open squares are
/// connected to their open neighbors, each step costs one, and ties go to
/// whichever square comes first in reading order.
struct Footing<'a>(&'a Battle);

impl<'a> SearchSpace for Footing<'a> {
    type Node = Point;
    type Cost = usize;
    type Rank = Point;

    fn adjacent(&self, p: &Point) -> Vec<Point> {
        self.0.open_neighbors(*p).collect()
    }

    fn heuristic(&self, from: &Point, to: &Point) -> usize {
        from.manhattan(*to)
    }

    fn cost(&self, _from: &Point, _to: &Point) -> usize {
        1
    }

    fn rank(&self, p: &Point) -> Point {
        *p
    }
}

impl FromStr for Battle {
    type Err = Error;

    /// Parse a map like this:
    ///
    /// ```text
    /// #######
    /// #.G...#   G(200)
    /// #...EG#   E(197), G(197)
    /// #######
    /// ```
    ///
    /// The hit point annotations are optional; units without one start at
    /// full strength. Blank lines and surrounding whitespace are ignored.
    fn from_str(s: &str) -> Result<Battle, Error> {
        fn map_and_hp(s: &str) -> (&str, &str) {
            // Does this line have HP information?
            match s.find(char::is_whitespace) {
                Some(map_end) => (&s[..map_end], s[map_end..].trim()),
                None => (s, ""),
            }
        }

        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(map_and_hp)
            .collect::<Vec<_>>();

        let width = match rows.first() {
            Some((row, _)) => row.chars().count(),
            None => return Err(format_err!("map is empty")),
        };
        for (y, (row, _)) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(format_err!(
                    "map row {} is {} squares wide, but the first row is {}",
                    y,
                    len,
                    width
                ));
            }
        }

        let mut cells = Grid::from_fn(width, rows.len(), |_| Cell::Floor);
        let mut units = Vec::new();
        for (y, (row, hps)) in rows.iter().enumerate() {
            let row_start = units.len();
            for (x, ch) in row.chars().enumerate() {
                let p = Point::new(x, y);
                cells[p] = match ch {
                    '#' => Cell::Wall,
                    '.' => Cell::Floor,
                    _ => match Faction::from_symbol(ch) {
                        Some(faction) => {
                            units.push(Unit::new(faction, p));
                            Cell::Unit(units.len() - 1)
                        }
                        None => return Err(format_err!("Bad map character: {:?}", ch)),
                    },
                };
            }
            set_hit_points(&mut units[row_start..], hps)?;
        }

        Ok(Battle {
            cells,
            units,
            rounds: 0,
            stalemate: false,
        })
    }
}

/// Apply annotations like `G(197), E(194)` to `row`, the units of one map
/// row, left to right.
fn set_hit_points(row: &mut [Unit], annotations: &str) -> Result<(), Error> {
    if annotations.is_empty() {
        return Ok(());
    }

    let mut units = row.iter_mut();
    for annotation in annotations.split(',').map(str::trim) {
        let mut cursor = annotation.chars();
        let faction = match cursor.next().and_then(Faction::from_symbol) {
            Some(faction) => faction,
            None => return Err(format_err!("Bad hp faction in {:?}", annotation)),
        };
        let digits = match cursor
            .as_str()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(digits) => digits,
            None => return Err(format_err!("expected '(hp)' after faction in {:?}", annotation)),
        };
        let hit_points = usize::from_str(digits)?;
        if hit_points == 0 {
            return Err(format_err!("dead unit on the map: {:?}", annotation));
        }

        let unit = match units.next() {
            Some(unit) => unit,
            None => return Err(format_err!("hp data has more units than map row")),
        };
        if unit.faction != faction {
            return Err(format_err!(
                "hp data {:?} doesn't match the unit at {}",
                annotation,
                unit.position
            ));
        }
        unit.hit_points = hit_points;
    }
    Ok(())
}

impl fmt::Display for Battle {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        for y in 0..self.cells.height() {
            let mut row_units = Vec::new();
            for x in 0..self.cells.width() {
                match self.cells[Point::new(x, y)] {
                    Cell::Wall => f.write_str("#")?,
                    Cell::Floor => f.write_str(".")?,
                    Cell::Unit(index) => {
                        let unit = &self.units[index];
                        write!(f, "{}", unit.faction.symbol())?;
                        row_units.push(unit);
                    }
                }
            }
            if !row_units.is_empty() {
                let hps = row_units
                    .iter()
                    .map(|u| format!("{}({})", u.faction.symbol(), u.hit_points))
                    .join(", ");
                write!(f, "   {}", hps)?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Battle {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str("\n")?;
        <Battle as fmt::Display>::fmt(self, f)
    }
}

/// Two battles are equal if they look the same: the same walls, and the same
/// units in the same places with the same hit points.
impl PartialEq for Battle {
    fn eq(&self, other: &Battle) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Battle {}
