//! Rectangular maps indexed by `Point`.

use itertools::iproduct;
use ndarray::Array2;
use std::ops::{Index, IndexMut};

use crate::Point;

/// Adjacent squares, in reading order: up, left, right, down.
static STEPS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// A `width` by `height` array of `T`, addressed by `Point`.
///
/// Indexing with `[]` panics outside the map; `get` checks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grid<T>(Array2<T>);

impl<T> Grid<T> {
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Grid<T>
    where
        F: FnMut(Point) -> T,
    {
        Grid(Array2::from_shape_fn((height, width), |(y, x)| {
            f(Point::new(x, y))
        }))
    }

    pub fn width(&self) -> usize {
        self.0.ncols()
    }

    pub fn height(&self) -> usize {
        self.0.nrows()
    }

    pub fn get(&self, p: Point) -> Option<&T> {
        self.0.get((p.y, p.x))
    }

    /// Every point on the map, in reading order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        iproduct!(0..self.height(), 0..self.width()).map(|(y, x)| Point::new(x, y))
    }

    /// The points orthogonally adjacent to `p` that lie on the map, in
    /// reading order.
    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> {
        let width = self.width() as isize;
        let height = self.height() as isize;
        STEPS.iter().filter_map(move |&(dx, dy)| {
            let x = p.x as isize + dx;
            let y = p.y as isize + dy;
            if 0 <= x && x < width && 0 <= y && y < height {
                Some(Point::new(x as usize, y as usize))
            } else {
                None
            }
        })
    }
}

impl<T> Index<Point> for Grid<T> {
    type Output = T;
    fn index(&self, p: Point) -> &T {
        &self.0[(p.y, p.x)]
    }
}

impl<T> IndexMut<Point> for Grid<T> {
    fn index_mut(&mut self, p: Point) -> &mut T {
        &mut self.0[(p.y, p.x)]
    }
}
