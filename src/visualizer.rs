//! ASCII visualization.
//!
//! Draws the scene, the agent outline and the latest laser hits into a character grid. Rows grow
//! with y, so the first printed row is the smallest y (screen convention).

use robot_simulator::domain::{Aabb, Footprint, Pose, Position, Scene};

/// Upper limit for either grid dimension. Larger scenes are scaled down to fit.
const MAX_CELLS: f64 = 160.0;

const EMPTY: char = '.';
const OBSTACLE: char = '#';
const AGENT: char = 'o';
const AGENT_CENTRE: char = '@';
const LASER_HIT: char = '*';

pub struct Visualizer {
    /// Cells per simulation unit.
    scale: f64,
}

impl Visualizer {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn render(
        &self,
        scene: &Scene,
        pose: Pose,
        footprint: Footprint,
        laser_hits: &[Position],
    ) -> String {
        let agent = footprint.at(pose);
        let extent = match scene.bounds() {
            Some(bounds) => bounds,
            None => scene.extent().union(&agent.bounding_box()),
        };
        let scale = self.fitted_scale(&extent);
        let columns = cells(extent.width(), scale);
        let rows = cells(extent.height(), scale);

        let mut grid = vec![vec![EMPTY; columns]; rows];
        for (row, line) in grid.iter_mut().enumerate() {
            for (column, cell) in line.iter_mut().enumerate() {
                let centre = Position::new(
                    extent.min.x() + (column as f64 + 0.5) / scale,
                    extent.min.y() + (row as f64 + 0.5) / scale,
                );
                if agent.contains_point(centre) {
                    *cell = AGENT;
                } else if scene
                    .obstacles()
                    .iter()
                    .any(|o| o.shape().contains_point(centre))
                {
                    *cell = OBSTACLE;
                }
            }
        }

        let mut mark = |position: Position, symbol: char| {
            if let Some((column, row)) = cell_of(&extent, scale, position, columns, rows) {
                grid[row][column] = symbol;
            }
        };
        for &hit in laser_hits {
            mark(hit, LASER_HIT);
        }
        mark(pose.position, AGENT_CENTRE);

        let border = format!("+{}+", "-".repeat(columns));
        let mut frame = String::with_capacity((columns + 3) * (rows + 2));
        frame.push_str(&border);
        frame.push('\n');
        for line in grid {
            frame.push('|');
            frame.extend(line);
            frame.push_str("|\n");
        }
        frame.push_str(&border);
        frame
    }

    fn fitted_scale(&self, extent: &Aabb) -> f64 {
        let largest = extent.width().max(extent.height());
        if largest * self.scale > MAX_CELLS {
            MAX_CELLS / largest
        } else {
            self.scale
        }
    }
}

fn cells(length: f64, scale: f64) -> usize {
    ((length * scale).ceil() as usize).max(1)
}

fn cell_of(
    extent: &Aabb,
    scale: f64,
    position: Position,
    columns: usize,
    rows: usize,
) -> Option<(usize, usize)> {
    let column = ((position.x() - extent.min.x()) * scale).floor();
    let row = ((position.y() - extent.min.y()) * scale).floor();
    if column < 0.0 || row < 0.0 || !column.is_finite() || !row.is_finite() {
        return None;
    }
    let (column, row) = (column as usize, row as usize);
    (column < columns && row < rows).then_some((column, row))
}
