/// Ribbon vertices emitted per centerline sample.
pub const VERTICES_PER_POINT: usize = 2;

/// Triangle indices emitted per centerline segment (two triangles).
pub const INDICES_PER_SEGMENT: usize = 6;

/// Fewest centerline samples the mesher accepts.
pub const MIN_RIBBON_POINTS: usize = 2;

/// Width of the zero-padded counter in generated ink names.
pub const INK_NAME_DIGITS: usize = 6;
