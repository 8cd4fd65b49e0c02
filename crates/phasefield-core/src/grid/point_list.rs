use glam::DVec3;

use super::{GridKind, SamplingGrid};
use crate::error::{FieldError, Result};

pub(super) fn build(points: Vec<DVec3>) -> Result<SamplingGrid> {
    if points.is_empty() {
        return Err(FieldError::configuration(
            "point list grid needs at least one point",
        ));
    }
    Ok(SamplingGrid::from_kind(GridKind::PointList(points), None, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_list_shape() {
        let grid = SamplingGrid::point_list(vec![DVec3::Z, DVec3::X, DVec3::Y]).unwrap();
        assert_eq!(grid.shape(), (3, 1));
        assert_eq!(grid.point_count(), 3);
        assert_eq!(grid.area(), None);
        assert_eq!(grid.spacing(), None);
        assert_eq!(grid.kind().name(), "point_list");
    }

    #[test]
    fn test_empty_point_list_rejected() {
        assert!(SamplingGrid::point_list(Vec::new())
            .unwrap_err()
            .is_configuration());
    }
}
