//! The Goblins-versus-Elves cave battle from Advent of Code 2018, day 15,
//! along with the generic search and grid machinery it runs on.

#[macro_use]
extern crate failure;

use std::cmp::Ordering;
use std::fmt;

pub mod battle;
pub mod boost;
pub mod flood;
pub mod grid;
pub mod search;

/// A square on a map.
///
/// Points are ordered the way text is read: top to bottom, and then left to
/// right within a row. Nearly every tie in the battle is broken this way, so
/// sorting a list of points puts the winner first.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Point {
        Point { x, y }
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Point) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Point) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{},{}", self.x, self.y)
    }
}

pub trait Manhattan {
    /// The number of orthogonal steps between `self` and `other`, ignoring
    /// anything in the way.
    fn manhattan(&self, other: Self) -> usize;
}

impl Manhattan for Point {
    fn manhattan(&self, other: Point) -> usize {
        fn manhattan1(a: usize, b: usize) -> usize {
            if a >= b {
                a - b
            } else {
                b - a
            }
        }

        manhattan1(self.x, other.x) + manhattan1(self.y, other.y)
    }
}
