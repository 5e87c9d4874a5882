// Pipeline processing: extraction of nested records, flattening, and normalization

pub mod extract;
pub mod flatten;
pub mod normalize;

pub use extract::{extract_bonus_point_reasons, extract_line_items};
pub use flatten::flatten;
pub use normalize::{build_line_items_table, build_table, TableLayout};
