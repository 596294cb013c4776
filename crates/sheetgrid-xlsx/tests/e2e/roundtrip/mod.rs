//! Write-then-read tests, grouped by feature.

mod cells;
mod comments;
mod dimensions;
mod merged_cells;
mod protection;
mod shifts;
